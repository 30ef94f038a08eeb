use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::models::Message;

const MESSAGE_COLUMNS: &str =
    "id, chat_room_id, sender_id, text, created_at, edited_at, deleted_at, deleted_by, is_edited, is_deleted";

pub async fn insert(
    conn: &mut SqliteConnection,
    chat_room_id: i64,
    sender_id: i64,
    text: &str,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(&format!(
        "INSERT INTO messages (chat_room_id, sender_id, text, created_at) VALUES (?, ?, ?, ?) RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(chat_room_id)
    .bind(sender_id)
    .bind(text)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<Message>> {
    sqlx::query_as::<_, Message>(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Messaggi di una stanza in ordine di invio, tombstone compresi.
pub async fn find_by_room(conn: &mut SqliteConnection, chat_room_id: i64) -> sqlx::Result<Vec<Message>> {
    // julianday confronta gli istanti a prescindere dalla formattazione;
    // a parità di istante decide l'id.
    sqlx::query_as::<_, Message>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_room_id = ? ORDER BY julianday(created_at), id"
    ))
    .bind(chat_room_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn update_text(
    conn: &mut SqliteConnection,
    id: i64,
    text: &str,
    edited_at: OffsetDateTime,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(&format!(
        "UPDATE messages SET text = ?, is_edited = TRUE, edited_at = ? WHERE id = ? RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(text)
    .bind(edited_at)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
}

/// Cancellazione logica: il testo viene svuotato, la riga resta.
pub async fn mark_deleted(
    conn: &mut SqliteConnection,
    id: i64,
    deleted_by: i64,
    deleted_at: OffsetDateTime,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(&format!(
        "UPDATE messages SET text = '', is_deleted = TRUE, deleted_at = ?, deleted_by = ? WHERE id = ? RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(deleted_at)
    .bind(deleted_by)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
}
