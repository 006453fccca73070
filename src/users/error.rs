use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    /// Malformed or missing input: path id, query params or body.
    #[error("{0}")]
    Validation(String),

    #[error("user not found")]
    NotFound,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("database error: {0}")]
    Store(#[source] sqlx::Error),

    #[error("{0} timed out")]
    Timeout(&'static str),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<sqlx::Error> for UserError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => UserError::NotFound,
            other => UserError::Store(other),
        }
    }
}

impl UserError {
    pub fn status(&self) -> StatusCode {
        match self {
            UserError::Validation(_) => StatusCode::BAD_REQUEST,
            UserError::NotFound => StatusCode::NOT_FOUND,
            UserError::Hashing(_) | UserError::Store(_) | UserError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(%status, error = %self, "error response");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
