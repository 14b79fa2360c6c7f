/// Admin authorization and game closure.
pub mod admin_service;
/// WebSocket chat transport.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Background reclamation of abandoned sessions.
pub mod expiry_sweeper;
/// Health check service.
pub mod health_service;
/// Leaderboard, results and personal statistics.
pub mod leaderboard_service;
/// Public service for the rules of the game.
pub mod public_service;
/// Session lifecycle: start, choices, reveal timing and finalization.
pub mod session_service;
/// Event payloads pushed onto the hub.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
