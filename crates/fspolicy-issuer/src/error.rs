//! Issuer error type and its HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fspolicy_core::{ErrorKind, PolicyError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IssueError>;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unknown app: {0}")]
    UnknownApp(String),
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl IssueError {
    /// Stable code for JSON bodies.
    pub fn code(&self) -> &'static str {
        match self {
            IssueError::BadRequest(_) => "BAD_REQUEST",
            IssueError::UnknownApp(_) => "UNKNOWN_APP",
            IssueError::NotAllowed(_) => "NOT_ALLOWED",
            IssueError::Config(_) => "CONFIG",
            IssueError::Policy(e) => e.kind().as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IssueError::BadRequest(_) => StatusCode::BAD_REQUEST,
            IssueError::UnknownApp(_) => StatusCode::NOT_FOUND,
            IssueError::NotAllowed(_) => StatusCode::FORBIDDEN,
            IssueError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IssueError::Policy(e) if e.kind() == ErrorKind::Encoding => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IssueError::Policy(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for IssueError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "request body rejected");
        IssueError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "msg": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
