use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use tower::ServiceExt;

use duelboard_api::config::{Config, Environment};
use duelboard_api::state::AppState;

/// Build application state backed by an in-memory `SQLite` database with
/// migrations applied.
pub async fn test_state() -> AppState {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();

    Migrator::up(&db, None).await.unwrap_or_default();

    AppState::new(
        db,
        Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            frontend_url: "http://localhost:3001".to_string(),
        },
    )
}

/// Build the app router over a fresh in-memory database.
pub async fn test_app() -> Router {
    duelboard_api::routes::router().with_state(test_state().await)
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();

    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}
