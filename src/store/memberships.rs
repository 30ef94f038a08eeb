use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::models::{MemberView, Membership, MembershipRole};

pub async fn insert(
    conn: &mut SqliteConnection,
    chat_room_id: i64,
    user_id: i64,
    role: MembershipRole,
) -> sqlx::Result<Membership> {
    sqlx::query_as::<_, Membership>(
        "INSERT INTO chat_room_memberships (chat_room_id, user_id, role, joined_at) VALUES (?, ?, ?, ?) RETURNING id, chat_room_id, user_id, role, joined_at",
    )
    .bind(chat_room_id)
    .bind(user_id)
    .bind(role)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *conn)
    .await
}

/// Inserisce la membership solo se l'utente non è già nella stanza.
pub async fn insert_if_absent(
    conn: &mut SqliteConnection,
    chat_room_id: i64,
    user_id: i64,
    role: MembershipRole,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO chat_room_memberships (chat_room_id, user_id, role, joined_at) VALUES (?, ?, ?, ?) ON CONFLICT (chat_room_id, user_id) DO NOTHING",
    )
    .bind(chat_room_id)
    .bind(user_id)
    .bind(role)
    .bind(OffsetDateTime::now_utc())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find(
    conn: &mut SqliteConnection,
    chat_room_id: i64,
    user_id: i64,
) -> sqlx::Result<Option<Membership>> {
    sqlx::query_as::<_, Membership>(
        "SELECT id, chat_room_id, user_id, role, joined_at FROM chat_room_memberships WHERE chat_room_id = ? AND user_id = ?",
    )
    .bind(chat_room_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_by_room(conn: &mut SqliteConnection, chat_room_id: i64) -> sqlx::Result<Vec<MemberView>> {
    sqlx::query_as::<_, MemberView>(
        r#"
        SELECT m.user_id, u.username, m.role
        FROM chat_room_memberships m
        JOIN users u ON u.id = m.user_id
        WHERE m.chat_room_id = ?
        ORDER BY m.id
        "#,
    )
    .bind(chat_room_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn update_role(conn: &mut SqliteConnection, id: i64, role: MembershipRole) -> sqlx::Result<()> {
    sqlx::query("UPDATE chat_room_memberships SET role = ? WHERE id = ?")
        .bind(role)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM chat_room_memberships WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
