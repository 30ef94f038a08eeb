use sqlx::FromRow;
use time::OffsetDateTime;

// --- Enum persistiti come testo maiuscolo ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl FriendRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "PENDING",
            FriendRequestStatus::Accepted => "ACCEPTED",
            FriendRequestStatus::Declined => "DECLINED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum RoomType {
    Private,
    Group,
}

impl RoomType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Private => "PRIVATE",
            RoomType::Group => "GROUP",
        }
    }
}

/// OWNER > ADMIN > MEMBER
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum MembershipRole {
    Owner,
    Admin,
    Member,
}

impl MembershipRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipRole::Owner => "OWNER",
            MembershipRole::Admin => "ADMIN",
            MembershipRole::Member => "MEMBER",
        }
    }

    /// Può aggiungere e rimuovere membri.
    pub fn can_manage_members(self) -> bool {
        matches!(self, MembershipRole::Owner | MembershipRole::Admin)
    }
}

// --- Tabelle ---

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Riga di `friend_requests` con gli username di mittente e destinatario.
#[derive(Debug, Clone, FromRow)]
pub struct FriendRequest {
    pub id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub receiver_id: i64,
    pub receiver_username: String,
    pub status: FriendRequestStatus,
    pub created_at: OffsetDateTime,
    pub responded_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatRoom {
    pub id: i64,
    pub room_type: RoomType,
    pub owner_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Stanza con il nome visualizzato calcolato in lettura.
#[derive(Debug, Clone, FromRow)]
pub struct RoomSummary {
    pub id: i64,
    pub room_type: RoomType,
    pub owner_id: Option<i64>,
    pub name: String,
}

/// I partecipanti sono sempre salvati con `user_a_id < user_b_id`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PrivateChatRoom {
    pub chat_room_id: i64,
    pub user_a_id: i64,
    pub user_b_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupChatRoom {
    pub chat_room_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub id: i64,
    pub chat_room_id: i64,
    pub user_id: i64,
    pub role: MembershipRole,
    pub joined_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MemberView {
    pub user_id: i64,
    pub username: String,
    pub role: MembershipRole,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub chat_room_id: i64,
    pub sender_id: i64,
    pub text: String,
    pub created_at: OffsetDateTime,
    pub edited_at: Option<OffsetDateTime>,
    pub deleted_at: Option<OffsetDateTime>,
    pub deleted_by: Option<i64>,
    pub is_edited: bool,
    pub is_deleted: bool,
}

/// Lunghezza massima del testo di un messaggio, in caratteri.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Username normalizzato: senza spazi ai bordi e minuscolo.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}
