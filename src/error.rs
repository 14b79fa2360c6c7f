use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::{sequence::SequenceError, session::SessionError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// New sessions are refused.
    #[error("the game is closed")]
    GameClosed,
    /// The player has no attempts left.
    #[error("no attempts left (best score: {best_score})")]
    QuotaExceeded {
        /// Best score reported back to the player.
        best_score: u32,
    },
    /// Input arrived for a player without a live session.
    #[error("no active session")]
    NoActiveSession,
    /// The player already has a live session.
    #[error("a session is already in progress")]
    SessionInProgress,
    /// Input arrived while the sequence is still shown.
    #[error("the sequence is still being revealed")]
    RevealInProgress,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Internal invariant violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable name of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::GameClosed => "game_closed",
            ServiceError::QuotaExceeded { .. } => "quota_exceeded",
            ServiceError::NoActiveSession => "no_active_session",
            ServiceError::SessionInProgress => "session_in_progress",
            ServiceError::RevealInProgress => "reveal_in_progress",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::GameClosed => ServiceError::GameClosed,
            SessionError::QuotaExceeded { best_score } => ServiceError::QuotaExceeded { best_score },
            SessionError::NoActiveSession => ServiceError::NoActiveSession,
            SessionError::SessionInProgress => ServiceError::SessionInProgress,
            SessionError::RevealInProgress => ServiceError::RevealInProgress,
            SessionError::UnknownSymbol(symbol) => {
                ServiceError::InvalidInput(format!("`{symbol}` is not one of the choices"))
            }
            SessionError::Sequence(err) => err.into(),
        }
    }
}

impl From<SequenceError> for ServiceError {
    fn from(err: SequenceError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Action refused by the game rules.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Quota exhausted.
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::GameClosed => AppError::Forbidden(message),
            ServiceError::QuotaExceeded { .. } => AppError::TooManyRequests(message),
            ServiceError::NoActiveSession => AppError::NotFound(message),
            ServiceError::SessionInProgress | ServiceError::RevealInProgress => {
                AppError::Conflict(message)
            }
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_map_to_http_statuses() {
        let cases = [
            (SessionError::GameClosed, StatusCode::FORBIDDEN),
            (
                SessionError::QuotaExceeded { best_score: 40 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (SessionError::NoActiveSession, StatusCode::NOT_FOUND),
            (SessionError::RevealInProgress, StatusCode::CONFLICT),
            (SessionError::SessionInProgress, StatusCode::CONFLICT),
            (
                SessionError::UnknownSymbol("?".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                SessionError::Sequence(SequenceError::InvalidLength {
                    requested: 9,
                    available: 8,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(ServiceError::from(err)).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn quota_message_reports_best_score() {
        let err = ServiceError::QuotaExceeded { best_score: 120 };
        assert_eq!(err.kind(), "quota_exceeded");
        assert!(err.to_string().contains("120"));
    }
}
