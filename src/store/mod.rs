//! Storage gateway for advertisement records.
//!
//! A [`Store`] is the process-wide handle (a connection pool for `PostgreSQL`).
//! It hands out [`Session`]s, one per request. A session is a unit of work:
//! writes stay invisible to other sessions until [`Session::commit`], and
//! anything uncommitted is discarded by [`Session::rollback`], [`Session::close`]
//! or drop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub(crate) mod unavailable;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

/// Table holding advertisements.
pub const TABLE: &str = "app_advertisements";

/// SQLSTATE `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// A persisted advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub user: String,
    /// Assigned by the store at insert time.
    pub creation_date: DateTime<Utc>,
}

/// Fields a client supplies when creating an advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewAdvertisement {
    pub title: String,
    pub description: String,
    pub user: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name when known.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A staged delete found its record already gone at commit time.
    #[error("record {0} was deleted by another session")]
    Vanished(i64),

    /// The session was used after it was closed.
    #[error("storage session is closed")]
    Closed,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Self::UniqueViolation(
                    db_err
                        .constraint()
                        .map_or_else(|| db_err.message().to_string(), str::to_string),
                )
            }
            _ => Self::Database(err),
        }
    }
}

/// Process-wide gateway handle.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a fresh session. Fails with `Unavailable`/`Database` when no
    /// connection can be acquired in time.
    async fn open(&self) -> Result<Box<dyn Session>, StoreError>;

    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release every pooled resource. Called once at shutdown.
    async fn close(&self);
}

/// One unit of work against the store, owned by a single request.
#[async_trait]
pub trait Session: Send {
    /// Look up a record by id. Sees this session's own uncommitted writes.
    async fn find(&mut self, id: i64) -> Result<Option<Advertisement>, StoreError>;

    /// Stage an insert. The store assigns `id` and `creation_date`.
    async fn insert(&mut self, new: &NewAdvertisement) -> Result<Advertisement, StoreError>;

    /// Stage a delete. Returns `false` when no such record exists.
    async fn delete(&mut self, id: i64) -> Result<bool, StoreError>;

    /// Make staged writes durable and visible to other sessions.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard staged writes.
    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Discard anything uncommitted and give the connection back. Any later
    /// call fails with [`StoreError::Closed`].
    async fn close(&mut self) -> Result<(), StoreError>;
}
