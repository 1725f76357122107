//! DuelBoard API - Backend for real-time two-player board games
//!
//! This crate provides:
//! - WebSocket matchmaking (random queue and invite-only rooms)
//! - In-session relay of moves, chat, resignations, and disconnects
//! - Outcome finalization with rating adjustments
//! - REST lookups for player profiles, game history, and the leaderboard

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod events;
pub mod hub;
pub mod persistence;
pub mod protocol;
pub mod rating;
pub mod routes;
pub mod state;
pub mod utils;
