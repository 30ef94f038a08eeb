//! Richieste di amicizia e righe di `friendships`.

use sqlx::SqliteConnection;
use time::OffsetDateTime;

use crate::models::{FriendRequest, FriendRequestStatus, User};

const REQUEST_SELECT: &str = r#"
    SELECT fr.id, fr.sender_id, s.username AS sender_username,
           fr.receiver_id, r.username AS receiver_username,
           fr.status, fr.created_at, fr.responded_at
    FROM friend_requests fr
    JOIN users s ON s.id = fr.sender_id
    JOIN users r ON r.id = fr.receiver_id
"#;

pub async fn insert_request(
    conn: &mut SqliteConnection,
    sender_id: i64,
    receiver_id: i64,
) -> sqlx::Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO friend_requests (sender_id, receiver_id, status, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(FriendRequestStatus::Pending)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn find_request(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<FriendRequest>> {
    sqlx::query_as::<_, FriendRequest>(&format!("{REQUEST_SELECT} WHERE fr.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Richiesta da `sender_id` a `receiver_id`, in qualsiasi stato.
pub async fn find_request_between(
    conn: &mut SqliteConnection,
    sender_id: i64,
    receiver_id: i64,
) -> sqlx::Result<Option<FriendRequest>> {
    sqlx::query_as::<_, FriendRequest>(&format!(
        "{REQUEST_SELECT} WHERE fr.sender_id = ? AND fr.receiver_id = ?"
    ))
    .bind(sender_id)
    .bind(receiver_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn find_requests_for_receiver(
    conn: &mut SqliteConnection,
    receiver_id: i64,
    status: FriendRequestStatus,
) -> sqlx::Result<Vec<FriendRequest>> {
    sqlx::query_as::<_, FriendRequest>(&format!(
        "{REQUEST_SELECT} WHERE fr.receiver_id = ? AND fr.status = ? ORDER BY fr.id"
    ))
    .bind(receiver_id)
    .bind(status)
    .fetch_all(&mut *conn)
    .await
}

/// Chiude una richiesta ancora PENDING. Restituisce `false` se la richiesta
/// era già stata gestita.
pub async fn resolve_request(
    conn: &mut SqliteConnection,
    id: i64,
    status: FriendRequestStatus,
    responded_at: OffsetDateTime,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE friend_requests SET status = ?, responded_at = ? WHERE id = ? AND status = ?",
    )
    .bind(status)
    .bind(responded_at)
    .bind(id)
    .bind(FriendRequestStatus::Pending)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Inserisce la riga (user_id, friend_id); non fa nulla se esiste già.
pub async fn insert_friendship(
    conn: &mut SqliteConnection,
    user_id: i64,
    friend_id: i64,
    created_at: OffsetDateTime,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO friendships (user_id, friend_id, created_at) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(friend_id)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn friendship_exists(
    conn: &mut SqliteConnection,
    user_id: i64,
    friend_id: i64,
) -> sqlx::Result<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_id = ? AND friend_id = ?)",
    )
    .bind(user_id)
    .bind(friend_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

pub async fn delete_friendship(
    conn: &mut SqliteConnection,
    user_id: i64,
    friend_id: i64,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM friendships WHERE user_id = ? AND friend_id = ?")
        .bind(user_id)
        .bind(friend_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Amici di `user_id`, cioè i `friend_id` delle righe che iniziano con lui.
pub async fn find_friends(conn: &mut SqliteConnection, user_id: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.password_hash, u.created_at
        FROM friendships f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = ?
        ORDER BY f.rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
}
