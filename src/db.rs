use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppResult;

/// Crea il pool di connessioni al database SQLite e applica le migrazioni.
/// Il file viene creato se non esiste.
pub async fn create_db_pool(db_url: &str, max_connections: u32) -> AppResult<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        // SQLite: attiva le FK
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database schema is up to date.");

    Ok(pool)
}
