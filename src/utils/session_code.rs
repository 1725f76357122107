use rand::Rng;

/// Characters allowed in session codes (uppercase alphanumeric, excluding confusing chars)
/// Removed: 0, O, I, 1, L to avoid confusion
const SESSION_CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const SESSION_CODE_LENGTH: usize = 8;

/// Generate a random session code of the given length.
///
/// Codes are drawn independently with no uniqueness check; the session store
/// re-draws on the (astronomically unlikely) collision with a live session.
pub fn random_session_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..SESSION_CODE_CHARS.len());
            SESSION_CODE_CHARS[idx] as char
        })
        .collect()
}

/// Default session code length (31^8 possible codes).
#[must_use]
pub const fn default_code_length() -> usize {
    SESSION_CODE_LENGTH
}

/// Validate session code format
#[must_use]
pub fn is_valid_session_code(code: &str) -> bool {
    code.len() >= SESSION_CODE_LENGTH
        && code
            .chars()
            .all(|c| SESSION_CODE_CHARS.contains(&(c.to_ascii_uppercase() as u8)))
}

/// Normalize session code (uppercase, trimmed)
#[must_use]
pub fn normalize_session_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_session_code_length() {
        let code = random_session_code(default_code_length());
        assert_eq!(code.len(), 8);
    }

    #[test]
    fn test_random_session_code_valid_chars() {
        for _ in 0..100 {
            let code = random_session_code(default_code_length());
            assert!(is_valid_session_code(&code));
        }
    }

    #[test]
    fn test_session_code_uniqueness() {
        let codes: std::collections::HashSet<String> = (0..1000)
            .map(|_| random_session_code(default_code_length()))
            .collect();
        // 31^8 codes; 1000 draws should essentially never collide
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_is_valid_session_code() {
        assert!(is_valid_session_code("ABC23492"));
        assert!(is_valid_session_code("XYZNMKPQ"));
        assert!(!is_valid_session_code("abc")); // too short
        assert!(!is_valid_session_code("ABC123!9")); // invalid chars
    }

    #[test]
    fn test_normalize_session_code() {
        assert_eq!(normalize_session_code("  abc23492  "), "ABC23492");
        assert_eq!(normalize_session_code("XyZ78992"), "XYZ78992");
    }
}
