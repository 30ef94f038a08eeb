//! Registrazione, login e risoluzione degli utenti.

use bcrypt::{hash, verify};

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{normalize_username, User};
use crate::store::{users, Store};

#[derive(Clone)]
pub struct IdentityDirectory {
    store: Store,
    bcrypt_cost: u32,
}

impl IdentityDirectory {
    pub fn new(store: Store, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<User> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(AppError::invalid("Username is required"));
        }
        if password.is_empty() {
            return Err(AppError::invalid("Password is required"));
        }

        {
            let mut conn = self.store.read().await?;
            if users::find_by_username(&mut conn, &username).await?.is_some() {
                return Err(AppError::already_exists("Username already taken"));
            }
        }

        // bcrypt è lento: lo facciamo fuori dai worker del runtime.
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(password, cost)).await??;

        let mut tx = self.store.write().await?;
        let user = match users::insert(tx.conn(), &username, &password_hash).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::already_exists("Username already taken"))
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Username sconosciuto e password errata producono lo stesso errore.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        let username = normalize_username(username);
        let user = {
            let mut conn = self.store.read().await?;
            users::find_by_username(&mut conn, &username).await?
        }
        .ok_or(AppError::Unauthenticated)?;

        let password = password.to_owned();
        let stored_hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify(password, &stored_hash).unwrap_or(false)).await?;
        if !valid {
            tracing::debug!(username = %username, "Rejected login");
            return Err(AppError::Unauthenticated);
        }

        Ok(user)
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        let mut conn = self.store.read().await?;
        users::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
