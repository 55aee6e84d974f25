use axum::{extract::rejection::JsonRejection, http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("missing caller identity")]
    Unauthenticated,
    #[error(transparent)]
    StoreUnavailable(#[from] anyhow::Error),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        use ChatError::*;
        match self {
            InvalidInput(_) | Unauthenticated => StatusCode::UNPROCESSABLE_ENTITY,
            Conflict(_) => StatusCode::CONFLICT,
            NotFound(_) => StatusCode::NOT_FOUND,
            Forbidden(_) => StatusCode::UNAUTHORIZED,
            StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ChatError::StoreUnavailable(err) = &self {
            tracing::error!("store failure: {err:#}\n\n{}", err.backtrace());
            return (status, "store unavailable").into_response();
        }

        tracing::debug!(%status, "rejected: {self}");
        (status, self.to_string()).into_response()
    }
}

// a missing, non-JSON or garbled body is treated like an empty one: invalid input
impl From<JsonRejection> for ChatError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}
