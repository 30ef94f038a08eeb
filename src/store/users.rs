use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::models::User;

const USER_COLUMNS: &str = "id, username, password_hash, created_at";

/// Inserisce un utente; lo username deve essere già normalizzato.
pub async fn insert(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(password_hash)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
}
