//! `chat_rooms` e le due specializzazioni private/gruppo.

use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::models::{ChatRoom, GroupChatRoom, PrivateChatRoom, RoomSummary, RoomType};

// Nome visualizzato: nome del gruppo, "a & b" per le private, "Room {id}"
// come ripiego.
const SUMMARY_SELECT: &str = r#"
    SELECT cr.id, cr.room_type, cr.owner_id,
           COALESCE(g.name, ua.username || ' & ' || ub.username, 'Room ' || cr.id) AS name
    FROM chat_rooms cr
    LEFT JOIN group_chat_rooms g ON g.chat_room_id = cr.id
    LEFT JOIN private_chat_rooms p ON p.chat_room_id = cr.id
    LEFT JOIN users ua ON ua.id = p.user_a_id
    LEFT JOIN users ub ON ub.id = p.user_b_id
"#;

pub async fn insert_room(
    conn: &mut SqliteConnection,
    room_type: RoomType,
    owner_id: Option<i64>,
) -> sqlx::Result<ChatRoom> {
    sqlx::query_as::<_, ChatRoom>(
        "INSERT INTO chat_rooms (room_type, owner_id, created_at) VALUES (?, ?, ?) RETURNING id, room_type, owner_id, created_at",
    )
    .bind(room_type)
    .bind(owner_id)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_room(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<ChatRoom>> {
    sqlx::query_as::<_, ChatRoom>(
        "SELECT id, room_type, owner_id, created_at FROM chat_rooms WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_summary(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<RoomSummary>> {
    sqlx::query_as::<_, RoomSummary>(&format!("{SUMMARY_SELECT} WHERE cr.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_all_summaries(conn: &mut SqliteConnection) -> sqlx::Result<Vec<RoomSummary>> {
    sqlx::query_as::<_, RoomSummary>(&format!("{SUMMARY_SELECT} ORDER BY cr.id"))
        .fetch_all(&mut *conn)
        .await
}

/// Stanze di un tipo di cui l'utente è membro.
pub async fn find_summaries_for_member(
    conn: &mut SqliteConnection,
    user_id: i64,
    room_type: RoomType,
) -> sqlx::Result<Vec<RoomSummary>> {
    sqlx::query_as::<_, RoomSummary>(&format!(
        r#"{SUMMARY_SELECT}
        JOIN chat_room_memberships m ON m.chat_room_id = cr.id
        WHERE m.user_id = ? AND cr.room_type = ?
        ORDER BY cr.id"#
    ))
    .bind(user_id)
    .bind(room_type)
    .fetch_all(&mut *conn)
    .await
}

/// Il chiamante garantisce `user_a_id < user_b_id`.
pub async fn insert_private(
    conn: &mut SqliteConnection,
    chat_room_id: i64,
    user_a_id: i64,
    user_b_id: i64,
) -> sqlx::Result<PrivateChatRoom> {
    sqlx::query("INSERT INTO private_chat_rooms (chat_room_id, user_a_id, user_b_id) VALUES (?, ?, ?)")
        .bind(chat_room_id)
        .bind(user_a_id)
        .bind(user_b_id)
        .execute(&mut *conn)
        .await?;
    Ok(PrivateChatRoom {
        chat_room_id,
        user_a_id,
        user_b_id,
    })
}

pub async fn find_private_by_users(
    conn: &mut SqliteConnection,
    user_a_id: i64,
    user_b_id: i64,
) -> sqlx::Result<Option<PrivateChatRoom>> {
    sqlx::query_as::<_, PrivateChatRoom>(
        "SELECT chat_room_id, user_a_id, user_b_id FROM private_chat_rooms WHERE user_a_id = ? AND user_b_id = ?",
    )
    .bind(user_a_id)
    .bind(user_b_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_group(
    conn: &mut SqliteConnection,
    chat_room_id: i64,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<GroupChatRoom> {
    sqlx::query_as::<_, GroupChatRoom>(
        "INSERT INTO group_chat_rooms (chat_room_id, name, description) VALUES (?, ?, ?) RETURNING chat_room_id, name, description, is_private",
    )
    .bind(chat_room_id)
    .bind(name)
    .bind(description)
    .fetch_one(&mut *conn)
    .await
}
