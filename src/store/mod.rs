//! Accesso persistente alle entità.
//!
//! Ogni sotto-modulo espone funzioni che lavorano su `&mut SqliteConnection`,
//! così le stesse query si usano sia su una connessione del pool sia dentro
//! una transazione aperta con [`Store::write`].

pub mod friends;
pub mod memberships;
pub mod messages;
pub mod rooms;
pub mod users;

use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::AppResult;

/// Handle condiviso verso il database.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
    // SQLite ammette un solo writer: serializzare le transazioni di scrittura
    // nel processo rende serializzabili le mutazioni multi-riga.
    writer: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Connessione per sole letture. Non va tenuta mentre si apre una
    /// scrittura.
    pub async fn read(&self) -> AppResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Apre una transazione di scrittura esclusiva.
    pub async fn write(&self) -> AppResult<WriteTx> {
        let guard = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTx { tx, _guard: guard })
    }
}

/// Transazione di scrittura. Se viene droppata senza `commit` fa rollback.
pub struct WriteTx {
    tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl WriteTx {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> AppResult<()> {
        let WriteTx { tx, _guard } = self;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqliteConnection;
    use time::OffsetDateTime;

    use super::Store;
    use crate::db;
    use crate::models::GroupChatRoom;

    /// Database su file temporaneo con lo schema reale.
    pub struct TestDb {
        pub store: Store,
        _dir: tempfile::TempDir,
    }

    pub async fn test_db() -> TestDb {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let pool = db::create_db_pool(&url, 4).await.expect("test pool");
        TestDb {
            store: Store::new(pool),
            _dir: dir,
        }
    }

    /// Istante di creazione della riga di amicizia, se esiste.
    pub async fn friendship_created_at(
        conn: &mut SqliteConnection,
        user_id: i64,
        friend_id: i64,
    ) -> Option<OffsetDateTime> {
        sqlx::query_as::<_, (OffsetDateTime,)>(
            "SELECT created_at FROM friendships WHERE user_id = ? AND friend_id = ?",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&mut *conn)
        .await
        .unwrap()
        .map(|(created_at,)| created_at)
    }

    /// Stanze private tra i due utenti, in qualunque ordine.
    pub async fn count_private_between(conn: &mut SqliteConnection, a: i64, b: i64) -> i64 {
        let (count,): (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM private_chat_rooms
               WHERE (user_a_id = ? AND user_b_id = ?) OR (user_a_id = ? AND user_b_id = ?)"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        count
    }

    pub async fn find_group(conn: &mut SqliteConnection, chat_room_id: i64) -> Option<GroupChatRoom> {
        sqlx::query_as::<_, GroupChatRoom>(
            "SELECT chat_room_id, name, description, is_private FROM group_chat_rooms WHERE chat_room_id = ?",
        )
        .bind(chat_room_id)
        .fetch_optional(&mut *conn)
        .await
        .unwrap()
    }

    pub async fn count_rows(conn: &mut SqliteConnection, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        count
    }
}
