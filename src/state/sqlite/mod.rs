use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::traits::HistoryStore;

mod contacts;
mod migrations;
mod signals;
mod trigger_log;

#[cfg(test)]
mod tests;

/// SQLite-backed trigger history store. WAL mode, single pool, schema
/// created idempotently on startup.
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        migrations::migrate(&pool).await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }
}

impl HistoryStore for SqliteHistoryStore {}

/// RFC 3339 cutoff string for "the last `days` days". Stored timestamps
/// are RFC 3339 UTC, so lexicographic comparison in SQL is correct.
fn cutoff_rfc3339(days: u32) -> String {
    (Utc::now() - Duration::days(days as i64)).to_rfc3339()
}

fn parse_dt(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
