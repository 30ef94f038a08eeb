//! Composizione delle stanze: chat private canoniche tra due utenti e
//! creazione dei gruppi.

use std::collections::HashSet;

use sqlx::SqliteConnection;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{MembershipRole, PrivateChatRoom, RoomSummary, RoomType};
use crate::store::{memberships, rooms, users, Store};

/// Cerca la stanza privata tra due utenti in entrambi gli ordini.
pub async fn probe_private_room(
    conn: &mut SqliteConnection,
    a: i64,
    b: i64,
) -> AppResult<Option<PrivateChatRoom>> {
    if let Some(room) = rooms::find_private_by_users(conn, a, b).await? {
        return Ok(Some(room));
    }
    Ok(rooms::find_private_by_users(conn, b, a).await?)
}

/// Materializza (in modo idempotente) la stanza privata tra `a` e `b`
/// dentro la transazione del chiamante.
pub async fn ensure_private_room(conn: &mut SqliteConnection, a: i64, b: i64) -> AppResult<PrivateChatRoom> {
    if let Some(existing) = probe_private_room(conn, a, b).await? {
        return Ok(existing);
    }

    let (first, second) = if a < b { (a, b) } else { (b, a) };

    let room = rooms::insert_room(conn, RoomType::Private, None).await?;
    let private = rooms::insert_private(conn, room.id, first, second).await?;
    memberships::insert_if_absent(conn, room.id, a, MembershipRole::Member).await?;
    memberships::insert_if_absent(conn, room.id, b, MembershipRole::Member).await?;

    tracing::info!(chat_room_id = room.id, user_a = first, user_b = second, "Private room created");
    Ok(private)
}

#[derive(Clone)]
pub struct RoomComposer {
    store: Store,
}

impl RoomComposer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Restituisce la stanza privata tra due utenti, creandola se manca.
    pub async fn get_private_room(&self, user1: i64, user2: i64) -> AppResult<RoomSummary> {
        if user1 == user2 {
            return Err(AppError::invalid("A private room needs two distinct users"));
        }

        // Percorso veloce: la stanza esiste già.
        let existing = {
            let mut conn = self.store.read().await?;
            probe_private_room(&mut conn, user1, user2).await?
        };

        let room_id = match existing {
            Some(room) => room.chat_room_id,
            None => match self.materialise_private_room(user1, user2).await {
                Ok(room) => room.chat_room_id,
                // Un altro writer l'ha creata per primo: rileggiamo una volta.
                Err(AppError::Database(e)) if is_unique_violation(&e) => {
                    tracing::debug!(user1, user2, "Private room insert lost a race, probing again");
                    let mut conn = self.store.read().await?;
                    probe_private_room(&mut conn, user1, user2)
                        .await?
                        .ok_or_else(|| AppError::Internal("private room missing after conflict".into()))?
                        .chat_room_id
                }
                Err(e) => return Err(e),
            },
        };

        self.summary(room_id).await
    }

    async fn materialise_private_room(&self, user1: i64, user2: i64) -> AppResult<PrivateChatRoom> {
        let mut tx = self.store.write().await?;
        for id in [user1, user2] {
            if users::find_by_id(tx.conn(), id).await?.is_none() {
                return Err(AppError::not_found("User not found"));
            }
        }
        let room = ensure_private_room(tx.conn(), user1, user2).await?;
        tx.commit().await?;
        Ok(room)
    }

    /// Crea un gruppo con il proprietario come OWNER e gli altri come MEMBER.
    /// Gli id sconosciuti vengono ignorati.
    pub async fn create_group_room(
        &self,
        owner_id: i64,
        name: &str,
        description: Option<&str>,
        member_ids: &[i64],
    ) -> AppResult<RoomSummary> {
        let mut tx = self.store.write().await?;
        let owner = users::find_by_id(tx.conn(), owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Owner not found"))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("Group name is required"));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        let room = rooms::insert_room(tx.conn(), RoomType::Group, Some(owner.id)).await?;
        rooms::insert_group(tx.conn(), room.id, name, description).await?;
        memberships::insert(tx.conn(), room.id, owner.id, MembershipRole::Owner).await?;

        let mut seen = HashSet::from([owner.id]);
        for &member_id in member_ids {
            if !seen.insert(member_id) {
                continue;
            }
            if users::find_by_id(tx.conn(), member_id).await?.is_none() {
                tracing::debug!(chat_room_id = room.id, member_id, "Skipping unknown member id");
                continue;
            }
            memberships::insert(tx.conn(), room.id, member_id, MembershipRole::Member).await?;
        }

        let summary = rooms::find_summary(tx.conn(), room.id)
            .await?
            .ok_or_else(|| AppError::Internal("group room missing after insert".into()))?;
        tx.commit().await?;

        tracing::info!(chat_room_id = room.id, owner_id, name = %name, "Group room created");
        Ok(summary)
    }

    /// Stanza di gruppo senza proprietario né membri.
    pub async fn create_lobby_room(&self, name: &str) -> AppResult<RoomSummary> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("Chat room name is required"));
        }

        let mut tx = self.store.write().await?;
        let room = rooms::insert_room(tx.conn(), RoomType::Group, None).await?;
        rooms::insert_group(tx.conn(), room.id, name, None).await?;
        let summary = rooms::find_summary(tx.conn(), room.id)
            .await?
            .ok_or_else(|| AppError::Internal("chat room missing after insert".into()))?;
        tx.commit().await?;

        tracing::info!(chat_room_id = room.id, name = %name, "Lobby room created");
        Ok(summary)
    }

    /// Tutte le stanze, private comprese.
    pub async fn list_rooms(&self) -> AppResult<Vec<RoomSummary>> {
        let mut conn = self.store.read().await?;
        Ok(rooms::find_all_summaries(&mut conn).await?)
    }

    pub async fn summary(&self, chat_room_id: i64) -> AppResult<RoomSummary> {
        let mut conn = self.store.read().await?;
        rooms::find_summary(&mut conn, chat_room_id)
            .await?
            .ok_or_else(|| AppError::not_found("Chat room not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{count_private_between, find_group, test_db, TestDb};

    async fn seed_users(db: &TestDb, names: &[&str]) -> Vec<i64> {
        let mut tx = db.store.write().await.unwrap();
        let mut ids = Vec::new();
        for name in names {
            ids.push(users::insert(tx.conn(), name, "hash").await.unwrap().id);
        }
        tx.commit().await.unwrap();
        ids
    }

    #[tokio::test]
    async fn private_room_is_canonical_and_idempotent() {
        let db = test_db().await;
        let ids = seed_users(&db, &["dani", "jwan"]).await;
        let composer = RoomComposer::new(db.store.clone());

        let first = composer.get_private_room(ids[1], ids[0]).await.unwrap();
        let second = composer.get_private_room(ids[0], ids[1]).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.room_type, RoomType::Private);
        assert_eq!(first.name, "dani & jwan");
        assert_eq!(first.owner_id, None);

        let mut conn = db.store.read().await.unwrap();
        let stored = rooms::find_private_by_users(&mut conn, ids[0], ids[1])
            .await
            .unwrap()
            .expect("stored with user_a < user_b");
        assert_eq!(stored.chat_room_id, first.id);
        assert_eq!(count_private_between(&mut conn, ids[0], ids[1]).await, 1);

        let members = memberships::find_by_room(&mut conn, first.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m.role == MembershipRole::Member));
    }

    #[tokio::test]
    async fn private_room_needs_two_existing_users() {
        let db = test_db().await;
        let ids = seed_users(&db, &["dani"]).await;
        let composer = RoomComposer::new(db.store.clone());

        assert!(matches!(
            composer.get_private_room(ids[0], ids[0]).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            composer.get_private_room(ids[0], 999).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn group_room_has_single_owner_and_skips_unknown_members() {
        let db = test_db().await;
        let ids = seed_users(&db, &["owner", "ann", "bob"]).await;
        let composer = RoomComposer::new(db.store.clone());

        let room = composer
            .create_group_room(ids[0], " friends ", Some("weekend"), &[ids[1], ids[1], ids[0], 777, ids[2]])
            .await
            .unwrap();
        assert_eq!(room.name, "friends");
        assert_eq!(room.room_type, RoomType::Group);
        assert_eq!(room.owner_id, Some(ids[0]));

        let mut conn = db.store.read().await.unwrap();
        let members = memberships::find_by_room(&mut conn, room.id).await.unwrap();
        let owners: Vec<_> = members.iter().filter(|m| m.role == MembershipRole::Owner).collect();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].user_id, ids[0]);
        assert_eq!(members.len(), 3);

        let group = find_group(&mut conn, room.id).await.unwrap();
        assert_eq!(group.description.as_deref(), Some("weekend"));
        assert!(!group.is_private);
    }

    #[tokio::test]
    async fn group_room_validation() {
        let db = test_db().await;
        let ids = seed_users(&db, &["owner"]).await;
        let composer = RoomComposer::new(db.store.clone());

        assert!(matches!(
            composer.create_group_room(ids[0], "  ", None, &[]).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            composer.create_group_room(404, "g", None, &[]).await,
            Err(AppError::NotFound(_))
        ));
        // Il proprietario si risolve prima di validare il nome.
        assert!(matches!(
            composer.create_group_room(404, "  ", None, &[]).await,
            Err(AppError::NotFound(_))
        ));
        assert!(composer.list_rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_rooms_uses_display_names() {
        let db = test_db().await;
        let ids = seed_users(&db, &["dani", "jwan"]).await;
        let composer = RoomComposer::new(db.store.clone());

        composer.create_group_room(ids[0], "g", None, &[]).await.unwrap();
        composer.get_private_room(ids[0], ids[1]).await.unwrap();
        let lobby = composer.create_lobby_room("lobby").await.unwrap();
        assert_eq!(lobby.owner_id, None);

        // Stanza senza specializzazione: ripiego su "Room {id}".
        let bare = {
            let mut tx = db.store.write().await.unwrap();
            let room = rooms::insert_room(tx.conn(), RoomType::Group, None).await.unwrap();
            tx.commit().await.unwrap();
            room
        };

        let names: Vec<String> = composer.list_rooms().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["g".to_string(), "dani & jwan".to_string(), "lobby".to_string(), format!("Room {}", bare.id)]);
    }
}
