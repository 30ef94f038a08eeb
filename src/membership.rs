//! Gestione dei membri dei gruppi in base al ruolo di chi richiede.

use sqlx::SqliteConnection;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{ChatRoom, MemberView, Membership, MembershipRole, RoomSummary, RoomType};
use crate::store::{memberships, rooms, users, Store};

#[derive(Clone)]
pub struct MembershipGovernor {
    store: Store,
}

/// Stanza di gruppo e ruolo del richiedente, già verificati.
struct GroupContext {
    room: ChatRoom,
    requester_role: Option<MembershipRole>,
}

async fn load_group_context(conn: &mut SqliteConnection, chat_room_id: i64, requester_id: i64) -> AppResult<GroupContext> {
    let room = rooms::find_room(conn, chat_room_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat room not found"))?;
    if room.room_type != RoomType::Group {
        return Err(AppError::invalid("Not a group chat"));
    }
    if users::find_by_id(conn, requester_id).await?.is_none() {
        return Err(AppError::not_found("Requester not found"));
    }
    let requester_role = memberships::find(conn, chat_room_id, requester_id).await?.map(|m| m.role);
    Ok(GroupContext { room, requester_role })
}

async fn load_subject(conn: &mut SqliteConnection, chat_room_id: i64, user_id: i64) -> AppResult<Membership> {
    if users::find_by_id(conn, user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    memberships::find(conn, chat_room_id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not a member"))
}

impl MembershipGovernor {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn role_of(&self, chat_room_id: i64, user_id: i64) -> AppResult<Option<MembershipRole>> {
        let mut conn = self.store.read().await?;
        Ok(memberships::find(&mut conn, chat_room_id, user_id).await?.map(|m| m.role))
    }

    /// Solo OWNER o ADMIN possono aggiungere.
    pub async fn add_member(&self, chat_room_id: i64, requester_id: i64, user_id: i64) -> AppResult<()> {
        let mut tx = self.store.write().await?;
        let ctx = load_group_context(tx.conn(), chat_room_id, requester_id).await?;
        if !ctx.requester_role.is_some_and(MembershipRole::can_manage_members) {
            return Err(AppError::denied("Insufficient permissions"));
        }

        if users::find_by_id(tx.conn(), user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        if memberships::find(tx.conn(), chat_room_id, user_id).await?.is_some() {
            return Err(AppError::already_exists("User already a member"));
        }

        match memberships::insert(tx.conn(), ctx.room.id, user_id, MembershipRole::Member).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(AppError::already_exists("User already a member")),
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        tracing::info!(chat_room_id, requester_id, user_id, "Member added");
        Ok(())
    }

    /// Solo OWNER o ADMIN possono rimuovere; l'OWNER non si rimuove.
    pub async fn remove_member(&self, chat_room_id: i64, requester_id: i64, user_id: i64) -> AppResult<()> {
        let mut tx = self.store.write().await?;
        let ctx = load_group_context(tx.conn(), chat_room_id, requester_id).await?;
        if !ctx.requester_role.is_some_and(MembershipRole::can_manage_members) {
            return Err(AppError::denied("Insufficient permissions"));
        }

        let subject = load_subject(tx.conn(), chat_room_id, user_id).await?;
        if subject.role == MembershipRole::Owner {
            return Err(AppError::invalid("Cannot remove owner"));
        }

        memberships::delete(tx.conn(), subject.id).await?;
        tx.commit().await?;

        tracing::info!(chat_room_id, requester_id, user_id, "Member removed");
        Ok(())
    }

    /// Solo l'OWNER promuove; promuovere chi non è MEMBER non fa nulla.
    pub async fn promote_member(&self, chat_room_id: i64, requester_id: i64, user_id: i64) -> AppResult<()> {
        let mut tx = self.store.write().await?;
        let ctx = load_group_context(tx.conn(), chat_room_id, requester_id).await?;
        if ctx.requester_role != Some(MembershipRole::Owner) {
            return Err(AppError::denied("Only owner can promote members"));
        }

        let subject = load_subject(tx.conn(), chat_room_id, user_id).await?;
        if subject.role == MembershipRole::Member {
            memberships::update_role(tx.conn(), subject.id, MembershipRole::Admin).await?;
            tx.commit().await?;
            tracing::info!(chat_room_id, user_id, "Member promoted to admin");
        }
        Ok(())
    }

    pub async fn list_members(&self, chat_room_id: i64) -> AppResult<Vec<MemberView>> {
        let mut conn = self.store.read().await?;
        if rooms::find_room(&mut conn, chat_room_id).await?.is_none() {
            return Err(AppError::not_found("Chat room not found"));
        }
        Ok(memberships::find_by_room(&mut conn, chat_room_id).await?)
    }

    /// Gruppi di cui l'utente fa parte; le stanze private sono escluse.
    pub async fn list_user_group_rooms(&self, user_id: i64) -> AppResult<Vec<RoomSummary>> {
        let mut conn = self.store.read().await?;
        if users::find_by_id(&mut conn, user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        Ok(rooms::find_summaries_for_member(&mut conn, user_id, RoomType::Group).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::RoomComposer;
    use crate::store::test_support::{test_db, TestDb};

    struct Fixture {
        _db: TestDb,
        governor: MembershipGovernor,
        composer: RoomComposer,
        ids: Vec<i64>,
    }

    // Utenti 0..4; gruppo creato da ids[0] con ids[1] e ids[2].
    async fn fixture() -> (Fixture, i64) {
        let db = test_db().await;
        let mut tx = db.store.write().await.unwrap();
        let mut ids = Vec::new();
        for name in ["owner", "ann", "bob", "cleo", "dev"] {
            ids.push(users::insert(tx.conn(), name, "hash").await.unwrap().id);
        }
        tx.commit().await.unwrap();

        let composer = RoomComposer::new(db.store.clone());
        let governor = MembershipGovernor::new(db.store.clone());
        let room = composer.create_group_room(ids[0], "g", None, &[ids[1], ids[2]]).await.unwrap();
        (Fixture { _db: db, governor, composer, ids }, room.id)
    }

    #[tokio::test]
    async fn member_cannot_add_until_promoted() {
        let (f, room) = fixture().await;
        let ids = &f.ids;

        assert!(matches!(
            f.governor.add_member(room, ids[1], ids[3]).await,
            Err(AppError::PermissionDenied(_))
        ));

        f.governor.promote_member(room, ids[0], ids[1]).await.unwrap();
        assert_eq!(f.governor.role_of(room, ids[1]).await.unwrap(), Some(MembershipRole::Admin));

        f.governor.add_member(room, ids[1], ids[3]).await.unwrap();
        assert_eq!(f.governor.role_of(room, ids[3]).await.unwrap(), Some(MembershipRole::Member));

        assert!(matches!(
            f.governor.add_member(room, ids[0], ids[3]).await,
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn owner_cannot_be_removed() {
        let (f, room) = fixture().await;
        let ids = &f.ids;

        assert!(matches!(
            f.governor.remove_member(room, ids[0], ids[0]).await,
            Err(AppError::InvalidArgument(_))
        ));

        f.governor.promote_member(room, ids[0], ids[1]).await.unwrap();
        assert!(matches!(
            f.governor.remove_member(room, ids[1], ids[0]).await,
            Err(AppError::InvalidArgument(_))
        ));

        f.governor.remove_member(room, ids[1], ids[2]).await.unwrap();
        assert_eq!(f.governor.role_of(room, ids[2]).await.unwrap(), None);
        assert!(matches!(
            f.governor.remove_member(room, ids[0], ids[2]).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_promotes_and_promotion_is_idempotent() {
        let (f, room) = fixture().await;
        let ids = &f.ids;

        f.governor.promote_member(room, ids[0], ids[1]).await.unwrap();
        assert!(matches!(
            f.governor.promote_member(room, ids[1], ids[2]).await,
            Err(AppError::PermissionDenied(_))
        ));

        // ADMIN e OWNER restano invariati.
        f.governor.promote_member(room, ids[0], ids[1]).await.unwrap();
        f.governor.promote_member(room, ids[0], ids[0]).await.unwrap();
        assert_eq!(f.governor.role_of(room, ids[0]).await.unwrap(), Some(MembershipRole::Owner));
        assert_eq!(f.governor.role_of(room, ids[1]).await.unwrap(), Some(MembershipRole::Admin));
    }

    #[tokio::test]
    async fn group_operations_reject_private_and_missing_rooms() {
        let (f, _) = fixture().await;
        let ids = &f.ids;
        let private = f.composer.get_private_room(ids[0], ids[4]).await.unwrap();

        assert!(matches!(
            f.governor.add_member(private.id, ids[0], ids[3]).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            f.governor.add_member(9_999, ids[0], ids[3]).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(f.governor.list_members(9_999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn outsiders_are_denied_and_unknown_users_not_found() {
        let (f, room) = fixture().await;
        let ids = &f.ids;

        assert!(matches!(
            f.governor.add_member(room, ids[4], ids[3]).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            f.governor.add_member(room, 555, ids[3]).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.governor.add_member(room, ids[0], 555).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listings() {
        let (f, room) = fixture().await;
        let ids = &f.ids;
        f.composer.get_private_room(ids[0], ids[1]).await.unwrap();

        let members = f.governor.list_members(room).await.unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["owner", "ann", "bob"]);
        assert_eq!(members[0].role, MembershipRole::Owner);

        let rooms = f.governor.list_user_group_rooms(ids[0]).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, room);
        assert_eq!(rooms[0].name, "g");

        assert!(f.governor.list_user_group_rooms(ids[4]).await.unwrap().is_empty());
        assert!(matches!(f.governor.list_user_group_rooms(555).await, Err(AppError::NotFound(_))));
    }
}
