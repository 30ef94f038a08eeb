//! Grafo sociale: ciclo di vita delle richieste di amicizia e amicizie
//! bidirezionali.

use time::OffsetDateTime;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{normalize_username, FriendRequest, FriendRequestStatus, User};
use crate::rooms;
use crate::store::{friends, users, Store};

#[derive(Clone)]
pub struct SocialGraph {
    store: Store,
}

impl SocialGraph {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn send_friend_request(&self, requester_id: i64, target_username: &str) -> AppResult<FriendRequest> {
        if requester_id <= 0 || target_username.trim().is_empty() {
            return Err(AppError::invalid("Missing data"));
        }
        let target = normalize_username(target_username);

        let mut tx = self.store.write().await?;
        let sender = users::find_by_id(tx.conn(), requester_id).await?;
        let receiver = users::find_by_username(tx.conn(), &target).await?;
        let (sender, receiver) = match (sender, receiver) {
            (Some(s), Some(r)) => (s, r),
            _ => return Err(AppError::not_found("User not found")),
        };

        if sender.id == receiver.id {
            return Err(AppError::invalid("Cannot add yourself"));
        }
        if friends::friendship_exists(tx.conn(), sender.id, receiver.id).await? {
            return Err(AppError::already_exists("Already friends"));
        }
        // Qualsiasi richiesta precedente, anche rifiutata, blocca una nuova.
        if friends::find_request_between(tx.conn(), sender.id, receiver.id).await?.is_some() {
            return Err(AppError::already_exists("Request already sent"));
        }

        let id = match friends::insert_request(tx.conn(), sender.id, receiver.id).await {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => return Err(AppError::already_exists("Request already sent")),
            Err(e) => return Err(e.into()),
        };
        let request = friends::find_request(tx.conn(), id)
            .await?
            .ok_or_else(|| AppError::Internal("friend request missing after insert".into()))?;
        tx.commit().await?;

        tracing::info!(request_id = id, sender_id = sender.id, receiver_id = receiver.id, "Friend request sent");
        Ok(request)
    }

    /// Accetta o rifiuta una richiesta PENDING. L'accettazione crea le due
    /// righe di amicizia e la stanza privata nella stessa transazione.
    pub async fn respond_friend_request(&self, request_id: i64, accept: bool) -> AppResult<FriendRequest> {
        let mut tx = self.store.write().await?;
        let request = friends::find_request(tx.conn(), request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Request not found"))?;

        if request.status != FriendRequestStatus::Pending {
            return Err(AppError::precondition("Request already handled"));
        }

        let status = if accept {
            FriendRequestStatus::Accepted
        } else {
            FriendRequestStatus::Declined
        };
        let now = OffsetDateTime::now_utc();
        if !friends::resolve_request(tx.conn(), request_id, status, now).await? {
            return Err(AppError::precondition("Request already handled"));
        }

        if accept {
            friends::insert_friendship(tx.conn(), request.sender_id, request.receiver_id, now).await?;
            friends::insert_friendship(tx.conn(), request.receiver_id, request.sender_id, now).await?;
            rooms::ensure_private_room(tx.conn(), request.sender_id, request.receiver_id).await?;
        }

        let updated = friends::find_request(tx.conn(), request_id)
            .await?
            .ok_or_else(|| AppError::Internal("friend request missing after update".into()))?;
        tx.commit().await?;

        tracing::info!(request_id, status = status.as_str(), "Friend request answered");
        Ok(updated)
    }

    pub async fn list_incoming_requests(&self, user_id: i64) -> AppResult<Vec<FriendRequest>> {
        let mut conn = self.store.read().await?;
        Ok(friends::find_requests_for_receiver(&mut conn, user_id, FriendRequestStatus::Pending).await?)
    }

    pub async fn list_friends(&self, user_id: i64) -> AppResult<Vec<User>> {
        let mut conn = self.store.read().await?;
        Ok(friends::find_friends(&mut conn, user_id).await?)
    }

    /// Elimina entrambe le righe. La stanza privata e la sua cronologia
    /// restano.
    pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut tx = self.store.write().await?;
        let removed = friends::delete_friendship(tx.conn(), user_id, friend_id).await?
            + friends::delete_friendship(tx.conn(), friend_id, user_id).await?;
        tx.commit().await?;

        if removed > 0 {
            tracing::info!(user_id, friend_id, "Friendship removed");
        }
        Ok(())
    }
}
