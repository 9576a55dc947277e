use crate::{
    models::UrlRecord,
    store::{RecordStore, StoreError},
};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

// ── Connection ─────────────────────────────────────────────────────────────

/// Open a SQLite pool for `database_url`, creating the file if it doesn't
/// exist yet, and make sure the schema is in place.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(
            database_url
                .parse::<SqliteConnectOptions>()?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
        )
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// One row per token. `token` duplicates the key so rows are self-describing.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS url_records (
             token    TEXT PRIMARY KEY NOT NULL,
             full_url TEXT NOT NULL
         )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Store ──────────────────────────────────────────────────────────────────

/// Durable record store on top of a SQLite pool.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of persisted records.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM url_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    /// Single upsert statement, so the row is replaced atomically.
    async fn put(&self, token: &str, full_url: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO url_records (token, full_url) VALUES (?1, ?2)
             ON CONFLICT(token) DO UPDATE SET full_url = excluded.full_url",
        )
        .bind(token)
        .bind(full_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<UrlRecord>, StoreError> {
        let record: Option<UrlRecord> =
            sqlx::query_as("SELECT token, full_url FROM url_records WHERE token = ?1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        Ok(record)
    }
}
