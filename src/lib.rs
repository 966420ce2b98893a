//! Library crate for player-kv-back, exposing modules for binaries and integration tests.

/// Bearer token extraction and verification.
pub mod auth;
/// Runtime configuration.
pub mod config;
/// Storage keys and KV backends.
pub mod dao;
/// Wire types of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// axum routers and handlers.
pub mod routes;
/// Request logic and background tasks.
pub mod services;
/// Shared application state.
pub mod state;
