//! Fruit CRUD handlers
//!
//! The body of a create request is the literal fruit name, unparsed; ids are
//! assigned by storage and never reused by this service.

use crate::db::{DbError, Fruit};
use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Response for the listing endpoint
#[derive(Debug, Serialize)]
pub struct FruitsResponse {
    pub fruits: Vec<Fruit>,
}

/// Response for the point-retrieval endpoint
#[derive(Debug, Serialize)]
pub struct FruitResponse {
    pub id: i32,
    pub name: String,
}

/// Create a fruit from the raw request body
pub async fn create_fruit(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<impl IntoResponse> {
    let body = body.map_err(|_| ServerError::BadRequest(""))?;
    let name = std::str::from_utf8(&body).map_err(|_| ServerError::BadRequest(""))?;

    state.db.insert_fruit(name).await?;
    Ok("ok")
}

/// List all fruits
pub async fn list_fruits(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let fruits = state
        .db
        .list_fruits(state.config.db_timeout())
        .await
        .map_err(|e| match e {
            // Failures to start the scan leak nothing; decode and iteration
            // failures surface their message.
            DbError::Decode(_) | DbError::Iterate(_) => ServerError::Storage(e),
            _ => ServerError::StorageOpaque,
        })?;

    Ok(Json(FruitsResponse { fruits }))
}

/// Retrieve a single fruit by id
pub async fn get_fruit(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let name = state.db.fruit_name(id, state.config.db_timeout()).await?;
    Ok(Json(FruitResponse { id, name }))
}

fn parse_id(raw: &str) -> ServerResult<i32> {
    raw.parse().map_err(|_| ServerError::BadRequest("non numeric id"))
}
