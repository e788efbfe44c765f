//! API route handlers
//!
//! One module per resource:
//!
//! - `fruits`: create, list, and point retrieval of fruit rows
//! - `sleep`: diagnostic endpoint simulating a long-running query
//! - `health`: liveness probe

pub mod fruits;
pub mod health;
pub mod sleep;

use crate::error::ServerError;

/// Root handler. The path is routed but intentionally unimplemented; it
/// answers 500 for every method.
pub async fn home() -> ServerError {
    ServerError::NotImplemented
}
