//! Messaggi: invio, cronologia, modifica, cancellazione logica e ricerca.

use time::OffsetDateTime;

use crate::error::{AppError, AppResult};
use crate::models::{Message, MAX_MESSAGE_CHARS};
use crate::store::{messages, rooms, users, Store};

/// Testo valido: non vuoto dopo il trim e al massimo `MAX_MESSAGE_CHARS`
/// caratteri. Restituisce il testo ripulito.
pub fn validate_text(text: &str) -> AppResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::invalid("Message text is required"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::invalid(format!(
            "Message text exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(text)
}

#[derive(Clone)]
pub struct MessageGateway {
    store: Store,
}

impl MessageGateway {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Il testo deve essere già stato validato dal chiamante.
    pub async fn send(&self, chat_room_id: i64, sender_id: i64, text: &str) -> AppResult<Message> {
        let mut tx = self.store.write().await?;
        if rooms::find_room(tx.conn(), chat_room_id).await?.is_none() {
            return Err(AppError::not_found("Chat room not found"));
        }
        if users::find_by_id(tx.conn(), sender_id).await?.is_none() {
            return Err(AppError::not_found("Sender not found"));
        }
        let message = messages::insert(tx.conn(), chat_room_id, sender_id, text).await?;
        tx.commit().await?;

        tracing::debug!(message_id = message.id, chat_room_id, sender_id, "Message stored");
        Ok(message)
    }

    pub async fn list_by_room(&self, chat_room_id: i64) -> AppResult<Vec<Message>> {
        let mut conn = self.store.read().await?;
        Ok(messages::find_by_room(&mut conn, chat_room_id).await?)
    }

    pub async fn edit(&self, message_id: i64, sender_id: i64, text: &str) -> AppResult<Message> {
        let mut tx = self.store.write().await?;
        let message = messages::find_by_id(tx.conn(), message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if message.sender_id != sender_id {
            return Err(AppError::denied("Cannot edit another user's message"));
        }
        if message.is_deleted {
            return Err(AppError::precondition("Cannot edit deleted message"));
        }
        let text = validate_text(text)?;

        let updated = messages::update_text(tx.conn(), message_id, text, OffsetDateTime::now_utc()).await?;
        tx.commit().await?;

        tracing::info!(message_id, sender_id, "Message edited");
        Ok(updated)
    }

    /// Idempotente: cancellare un messaggio già cancellato ne restituisce
    /// lo stato corrente.
    pub async fn delete(&self, message_id: i64, requester_id: i64) -> AppResult<Message> {
        let mut tx = self.store.write().await?;
        let message = messages::find_by_id(tx.conn(), message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message not found"))?;

        if message.sender_id != requester_id {
            return Err(AppError::denied("Cannot delete another user's message"));
        }
        if message.is_deleted {
            return Ok(message);
        }

        let deleted = messages::mark_deleted(tx.conn(), message_id, requester_id, OffsetDateTime::now_utc()).await?;
        tx.commit().await?;

        tracing::info!(message_id, requester_id, "Message deleted");
        Ok(deleted)
    }

    /// Ricerca per sottostringa senza distinzione tra maiuscole e minuscole.
    pub async fn search(&self, chat_room_id: i64, query: &str) -> AppResult<Vec<Message>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid("Query text is required"));
        }
        let needle = query.to_lowercase();

        let history = self.list_by_room(chat_room_id).await?;
        Ok(history
            .into_iter()
            .filter(|m| m.text.to_lowercase().contains(&needle))
            .collect())
    }
}
