//! Data-access layer over the backing PostgreSQL server
//!
//! All storage traffic goes through [`Db`], a cheaply cloneable handle around
//! a shared `tokio_postgres::Client`. The driver multiplexes concurrent
//! statements over the one connection, so the handle is safe to share across
//! request tasks without any in-process locking.
//!
//! Request-scoped calls take an explicit `Duration` budget at the call site.
//! The statement future is raced against the budget; on expiry the driver's
//! out-of-band cancellation protocol aborts the statement server-side before
//! a timeout error is reported. If the caller's task is dropped mid-flight
//! (client disconnected), a drop guard fires the same cancellation so the
//! statement never keeps running unobserved.

use crate::config::DatabaseConfig;
use futures::{pin_mut, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{CancelToken, NoTls, Row};

const INSERT_FRUIT: &str = "INSERT INTO fruit (name) VALUES ($1)";
const LIST_FRUITS: &str = "SELECT f.id, f.name FROM fruit AS f";
const GET_FRUIT_NAME: &str = "SELECT f.name FROM fruit AS f WHERE f.id = $1";
const SLEEP: &str = "SELECT pg_sleep($1)";

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Connecting or pinging the server failed.
    #[error(transparent)]
    Connect(tokio_postgres::Error),

    /// A statement failed to start or execute.
    #[error(transparent)]
    Query(tokio_postgres::Error),

    /// A result row could not be decoded into the expected types.
    #[error(transparent)]
    Decode(tokio_postgres::Error),

    /// The result stream failed mid-iteration.
    #[error(transparent)]
    Iterate(tokio_postgres::Error),

    /// The per-call budget elapsed; the statement was canceled server-side.
    #[error("query timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A single fruit row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fruit {
    pub id: i32,
    pub name: String,
}

impl Fruit {
    fn decode(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get(0)?,
            name: row.try_get(1)?,
        })
    }
}

/// Shared handle to the backing PostgreSQL server
#[derive(Clone)]
pub struct Db {
    client: Arc<tokio_postgres::Client>,
    cancel: CancelToken,
}

impl Db {
    /// Connect to the server described by `cfg` and spawn the connection
    /// driver task. The caller should [`ping`](Self::ping) before serving.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, DbError> {
        let (client, connection) = tokio_postgres::connect(&cfg.conn_string(), NoTls)
            .await
            .map_err(DbError::Connect)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection terminated");
            }
        });

        let cancel = client.cancel_token();
        Ok(Self {
            client: Arc::new(client),
            cancel,
        })
    }

    /// Round-trip to the server to verify reachability.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.client
            .batch_execute("SELECT 1")
            .await
            .map_err(DbError::Connect)
    }

    /// Insert a fruit with the given name; the id is assigned by storage.
    pub async fn insert_fruit(&self, name: &str) -> Result<(), DbError> {
        self.client
            .execute(INSERT_FRUIT, &[&name])
            .await
            .map(|_| ())
            .map_err(DbError::Query)
    }

    /// Select all fruit rows, streamed and decoded within `budget`.
    ///
    /// A row that fails to decode ends iteration early and discards the
    /// partial result; the stream is released before the error is reported.
    /// Decode failures take precedence over mid-stream iteration failures.
    pub async fn list_fruits(&self, budget: Duration) -> Result<Vec<Fruit>, DbError> {
        self.bounded(budget, async {
            let params = std::iter::empty::<&(dyn ToSql + Sync)>();
            let rows = self
                .client
                .query_raw(LIST_FRUITS, params)
                .await
                .map_err(DbError::Query)?;
            pin_mut!(rows);

            let mut fruits = Vec::new();
            let mut decode_err = None;
            let mut iter_err = None;
            while let Some(item) = rows.next().await {
                match item {
                    Ok(row) => match Fruit::decode(&row) {
                        Ok(fruit) => fruits.push(fruit),
                        Err(e) => {
                            decode_err = Some(e);
                            break;
                        }
                    },
                    Err(e) => {
                        iter_err = Some(e);
                        break;
                    }
                }
            }

            // The stream is dropped (releasing the portal) when this block
            // returns, before the caller sees any of these errors.
            if let Some(e) = decode_err {
                return Err(DbError::Decode(e));
            }
            if let Some(e) = iter_err {
                return Err(DbError::Iterate(e));
            }
            Ok(fruits)
        })
        .await
    }

    /// Point lookup of a fruit name by id within `budget`.
    ///
    /// The driver reports an absent row as a generic query error; callers see
    /// that error verbatim rather than a distinct not-found case.
    pub async fn fruit_name(&self, id: i32, budget: Duration) -> Result<String, DbError> {
        self.bounded(budget, async {
            let row = self
                .client
                .query_one(GET_FRUIT_NAME, &[&id])
                .await
                .map_err(DbError::Query)?;
            row.try_get(0).map_err(DbError::Decode)
        })
        .await
    }

    /// Run `pg_sleep` for `seconds` within `budget`.
    ///
    /// Any requested duration at or above the budget is expected to be
    /// aborted by server-side cancellation.
    pub async fn sleep(&self, seconds: i64, budget: Duration) -> Result<(), DbError> {
        self.bounded(budget, async {
            let secs = seconds as f64;
            self.client
                .query(SLEEP, &[&secs])
                .await
                .map(|_| ())
                .map_err(DbError::Query)
        })
        .await
    }

    /// Race `op` against `budget`. On expiry the in-flight statement is
    /// canceled server-side (best effort) and a timeout error is returned.
    /// A drop guard covers abandonment: if the whole call is dropped while
    /// `op` is pending, the cancellation still fires.
    async fn bounded<T, F>(&self, budget: Duration, op: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        let guard = CancelOnDrop::arm(self.cancel.clone());
        tokio::select! {
            res = op => {
                guard.disarm();
                res
            }
            () = tokio::time::sleep(budget) => {
                guard.disarm();
                let _ = self.cancel.cancel_query(NoTls).await;
                Err(DbError::Timeout(budget))
            }
        }
    }
}

/// Fires out-of-band query cancellation from `Drop` unless disarmed.
///
/// Covers the client-disconnect path: hyper drops the handler future when
/// the peer goes away, which drops the pending statement future here.
struct CancelOnDrop {
    token: Option<CancelToken>,
}

impl CancelOnDrop {
    fn arm(token: CancelToken) -> Self {
        Self { token: Some(token) }
    }

    fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = token.cancel_query(NoTls).await;
                });
            }
        }
    }
}
