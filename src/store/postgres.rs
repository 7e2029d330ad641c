//! `PostgreSQL` gateway built on a `sqlx` connection pool.
//!
//! Each session runs inside a database transaction begun when the session is
//! opened. Dropping an unfinished transaction rolls it back and returns the
//! connection to the pool, so an abandoned session never leaves a write behind.

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Connection, PgConnection, PgPool, Postgres, Row, Transaction,
};
use std::time::Duration;
use tracing::{debug, info_span, instrument, Instrument};

use super::{Advertisement, NewAdvertisement, Session, Store, StoreError};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const COLUMNS: &str = r#"id, title, description, "user", creation_date"#;

/// Pool settings taken from the command line.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect the pool.
    /// # Errors
    /// Returns an error if the first connection cannot be established.
    pub async fn connect(dsn: &str, options: &PoolOptions) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        Ok(Self { pool })
    }

    /// Create the advertisement table and its index when missing.
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn provision(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        for statement in split_sql_statements(SCHEMA_SQL) {
            sqlx::query(&statement).execute(&mut *conn).await?;
        }
        debug!("schema provisioned");

        Ok(())
    }
}

/// Splits a schema file into individual statements, dropping `--` comment lines.
/// Assumes statements end with `;` at the end of a line.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[async_trait]
impl Store for PgStore {
    async fn open(&self) -> Result<Box<dyn Session>, StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "BEGIN"
        );
        let tx = self.pool.begin().instrument(acquire_span).await?;

        Ok(Box::new(PgSession {
            pool: self.pool.clone(),
            tx: Some(tx),
            closed: false,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        let conn: &mut PgConnection = &mut conn;
        conn.ping().await?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("database pool closed");
    }
}

struct PgSession {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
    closed: bool,
}

impl PgSession {
    /// The open transaction, starting a new one after a commit or rollback.
    async fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if self.tx.is_none() {
            self.tx = Some(self.pool.begin().await?);
        }
        self.tx.as_mut().ok_or(StoreError::Closed)
    }
}

fn advertisement(row: &PgRow) -> Result<Advertisement, StoreError> {
    Ok(Advertisement {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        user: row.try_get("user")?,
        creation_date: row.try_get("creation_date")?,
    })
}

#[async_trait]
impl Session for PgSession {
    #[instrument(skip(self))]
    async fn find(&mut self, id: i64) -> Result<Option<Advertisement>, StoreError> {
        let tx = self.tx().await?;
        let query = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", super::TABLE);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.as_ref().map(advertisement).transpose()
    }

    #[instrument(skip(self, new), fields(title = %new.title))]
    async fn insert(&mut self, new: &NewAdvertisement) -> Result<Advertisement, StoreError> {
        let tx = self.tx().await?;
        let query = format!(
            r#"INSERT INTO {} (title, description, "user") VALUES ($1, $2, $3) RETURNING {COLUMNS}"#,
            super::TABLE
        );
        let row = sqlx::query(&query)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.user)
            .fetch_one(&mut **tx)
            .await?;

        advertisement(&row)
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, id: i64) -> Result<bool, StoreError> {
        let tx = self.tx().await?;
        let query = format!("DELETE FROM {} WHERE id = $1", super::TABLE);
        let result = sqlx::query(&query).bind(id).execute(&mut **tx).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }

        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        self.closed = true;
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS app_advertisements"));
        assert!(statements[1].starts_with("CREATE INDEX IF NOT EXISTS"));
    }

    #[test]
    fn split_keeps_trailing_statement_without_semicolon() {
        let statements = split_sql_statements("-- note\nSELECT 1;\nSELECT 2");
        assert_eq!(statements, vec!["SELECT 1;".to_string(), "SELECT 2".to_string()]);
    }

    #[test]
    fn default_pool_options() {
        let options = PoolOptions::default();
        assert_eq!(options.max_connections, 5);
        assert_eq!(options.acquire_timeout, Duration::from_secs(5));
    }
}
