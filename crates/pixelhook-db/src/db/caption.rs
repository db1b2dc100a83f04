use async_trait::async_trait;
use pixelhook_core::config::is_sql_identifier;
use pixelhook_core::{Caption, DatabaseConfig, DbCredentials};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to connect to database: {0}")]
    Connect(String),

    #[error("Database connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to execute caption update: {0}")]
    Execute(String),

    #[error("Failed to commit caption update: {0}")]
    Commit(String),
}

/// Result of a keyed caption update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Updated { rows: u64 },
    /// No row carries the identifier
    NotFound,
}

/// Opens per-invocation sessions against the caption store.
#[async_trait]
pub trait CaptionRepository: Send + Sync {
    async fn open(
        &self,
        credentials: &DbCredentials,
    ) -> Result<Box<dyn CaptionSession>, PersistenceError>;
}

/// A single open connection. Consumed by the update, which commits and closes it.
#[async_trait]
pub trait CaptionSession: Send {
    async fn update_caption(
        self: Box<Self>,
        identifier: &str,
        caption: &Caption,
    ) -> Result<PersistOutcome, PersistenceError>;

    /// Close without writing, for invocations that fail after connecting.
    async fn close(self: Box<Self>);
}

/// Table and column names of the caption store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTable {
    table: String,
    caption_column: String,
    key_column: String,
}

impl CaptionTable {
    pub fn new(
        table: impl Into<String>,
        caption_column: impl Into<String>,
        key_column: impl Into<String>,
    ) -> Result<Self, anyhow::Error> {
        let table = Self {
            table: table.into(),
            caption_column: caption_column.into(),
            key_column: key_column.into(),
        };
        for name in [&table.table, &table.caption_column, &table.key_column] {
            if !is_sql_identifier(name) {
                anyhow::bail!("Not a plain SQL identifier: {:?}", name);
            }
        }
        Ok(table)
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, anyhow::Error> {
        Self::new(&config.table, &config.caption_column, &config.key_column)
    }

    pub fn update_sql(&self) -> String {
        format!(
            "UPDATE `{}` SET `{}` = ? WHERE `{}` = ?",
            self.table, self.caption_column, self.key_column
        )
    }

    /// MySQL reports changed rather than matched rows, so rewriting an identical
    /// caption affects zero rows. This disambiguates that from a missing record.
    pub fn exists_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM `{}` WHERE `{}` = ?",
            self.table, self.key_column
        )
    }
}

/// MySQL caption store
#[derive(Debug, Clone)]
pub struct MySqlCaptionRepository {
    table: CaptionTable,
    connect_timeout: Duration,
}

impl MySqlCaptionRepository {
    pub fn new(table: CaptionTable, connect_timeout: Duration) -> Self {
        Self {
            table,
            connect_timeout,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, anyhow::Error> {
        Ok(Self::new(
            CaptionTable::from_config(config)?,
            config.connect_timeout(),
        ))
    }
}

#[async_trait]
impl CaptionRepository for MySqlCaptionRepository {
    async fn open(
        &self,
        credentials: &DbCredentials,
    ) -> Result<Box<dyn CaptionSession>, PersistenceError> {
        let start = std::time::Instant::now();
        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.username)
            .password(&credentials.password)
            .database(&credentials.dbname);

        let conn = tokio::time::timeout(self.connect_timeout, MySqlConnection::connect_with(&options))
            .await
            .map_err(|_| PersistenceError::Timeout(self.connect_timeout))?
            .map_err(|e| PersistenceError::Connect(e.to_string()))?;

        tracing::debug!(
            host = %credentials.host,
            dbname = %credentials.dbname,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Database connection established"
        );

        Ok(Box::new(MySqlCaptionSession {
            conn,
            table: self.table.clone(),
        }))
    }
}

struct MySqlCaptionSession {
    conn: MySqlConnection,
    table: CaptionTable,
}

#[async_trait]
impl CaptionSession for MySqlCaptionSession {
    async fn update_caption(
        self: Box<Self>,
        identifier: &str,
        caption: &Caption,
    ) -> Result<PersistOutcome, PersistenceError> {
        let MySqlCaptionSession { mut conn, table } = *self;

        let result = async {
            let mut tx = conn
                .begin()
                .await
                .map_err(|e| PersistenceError::Execute(e.to_string()))?;

            let done = sqlx::query(&table.update_sql())
                .bind(caption.as_str())
                .bind(identifier)
                .execute(&mut *tx)
                .await
                .map_err(|e| PersistenceError::Execute(e.to_string()))?;

            let mut rows = done.rows_affected();
            if rows == 0 {
                let matched: i64 = sqlx::query_scalar(&table.exists_sql())
                    .bind(identifier)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| PersistenceError::Execute(e.to_string()))?;
                rows = matched.max(0) as u64;
            }

            tx.commit()
                .await
                .map_err(|e| PersistenceError::Commit(e.to_string()))?;

            Ok::<u64, PersistenceError>(rows)
        }
        .await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection cleanly");
        }

        match result? {
            0 => Ok(PersistOutcome::NotFound),
            rows => Ok(PersistOutcome::Updated { rows }),
        }
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection cleanly");
        }
    }
}
