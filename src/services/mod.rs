/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Anonymous player state operations.
pub mod player_state_service;
/// Authenticated save data operations.
pub mod save_service;
/// Background connection management for the KV backend.
pub mod storage_supervisor;
