//! DTO definitions used by the admin REST API and documentation layer.

use serde::Serialize;
use utoipa::ToSchema;

/// Response of the close request.
#[derive(Debug, Serialize, ToSchema)]
pub struct CloseGameResponse {
    /// Always true after the request.
    pub closed: bool,
    /// True when the game was already closed before this request.
    pub already_closed: bool,
    /// Live sessions left running to completion.
    pub sessions_in_flight: usize,
}
