use crate::db::DbError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// Error bodies are plain text: client input errors carry a short static
/// hint, storage errors carry the underlying driver message verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Malformed client input; storage is never contacted.
    #[error("{0}")]
    BadRequest(&'static str),

    /// Storage/backend failure, message passed through verbatim.
    #[error(transparent)]
    Storage(#[from] DbError),

    /// Storage failure that must not leak its message.
    #[error("")]
    StorageOpaque,

    /// The route exists but has no implementation.
    #[error("not implemented")]
    NotImplemented,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Storage(_) | ServerError::StorageOpaque | ServerError::NotImplemented => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        (status, message).into_response()
    }
}
