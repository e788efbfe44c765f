//! Orchard - HTTPS REST API for a fruit inventory backed by PostgreSQL
//!
//! This crate provides a small HTTPS server exposing CRUD-style endpoints
//! for a single `fruit` table plus a diagnostic endpoint that simulates a
//! long-running query. It supports:
//!
//! - **Bounded storage calls**: every request-scoped statement carries an
//!   explicit deadline and is canceled server-side on expiry or client
//!   disconnect
//! - **TLS termination**: rustls with locally supplied PEM material
//! - **Configuration**: environment variable and file-based configuration
//! - **Structured logging**: request IDs and access logs via `tracing`
//! - **Graceful shutdown**: SIGTERM / Ctrl+C handling
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use orchard::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     orchard::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /api/v1/fruits` - List all fruits
//! - `POST /api/v1/fruits` - Create a fruit (raw body is the name)
//! - `GET /api/v1/fruits/{id}` - Retrieve one fruit by id
//! - `GET /api/v1/sleep?d={seconds}` - Storage-side sleep, bounded at 5 s
//! - `GET /health` - Liveness probe
//! - `GET /` - Always answers 500 "not implemented"
//!
//! The backing table is created by hand:
//!
//! ```sql
//! CREATE TABLE fruit (id SERIAL, name TEXT);
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod tls;

pub use config::ServerConfig;
pub use db::{Db, DbError, Fruit};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
