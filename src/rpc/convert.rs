use time::OffsetDateTime;

use super::proto;
use crate::models::{FriendRequest, MemberView, Message, RoomSummary, User};

/// Secondi dall'epoch; 0 quando il valore manca.
fn unix(ts: Option<OffsetDateTime>) -> i64 {
    ts.map(OffsetDateTime::unix_timestamp).unwrap_or(0)
}

impl From<User> for proto::User {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at_unix: user.created_at.unix_timestamp(),
        }
    }
}

impl From<User> for proto::FriendDto {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

impl From<FriendRequest> for proto::FriendRequestDto {
    fn from(req: FriendRequest) -> Self {
        Self {
            id: req.id,
            sender_id: req.sender_id,
            sender_username: req.sender_username,
            receiver_id: req.receiver_id,
            receiver_username: req.receiver_username,
            status: req.status.as_str().to_string(),
            created_at_unix: req.created_at.unix_timestamp(),
            responded_at_unix: unix(req.responded_at),
        }
    }
}

impl From<RoomSummary> for proto::ChatRoom {
    fn from(room: RoomSummary) -> Self {
        Self {
            id: room.id,
            name: room.name,
            room_type: room.room_type.as_str().to_string(),
        }
    }
}

impl From<MemberView> for proto::ChatRoomMemberDto {
    fn from(member: MemberView) -> Self {
        Self {
            user_id: member.user_id,
            username: member.username,
            role: member.role.as_str().to_string(),
        }
    }
}

impl From<Message> for proto::Message {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            chat_room_id: msg.chat_room_id,
            sender_id: msg.sender_id,
            text: msg.text,
            sent_at_unix: msg.created_at.unix_timestamp(),
            is_edited: msg.is_edited,
            is_deleted: msg.is_deleted,
            edited_at_unix: unix(msg.edited_at),
            deleted_at_unix: unix(msg.deleted_at),
            deleted_by: msg.deleted_by.unwrap_or(0),
        }
    }
}

/// Converte una lista di righe nei DTO corrispondenti.
pub fn all<T, U: From<T>>(rows: Vec<T>) -> Vec<U> {
    rows.into_iter().map(U::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FriendRequestStatus, RoomType};
    use time::macros::datetime;

    #[test]
    fn unset_timestamps_become_zero() {
        let msg = Message {
            id: 7,
            chat_room_id: 3,
            sender_id: 1,
            text: String::new(),
            created_at: datetime!(2024-05-01 10:00 UTC),
            edited_at: None,
            deleted_at: Some(datetime!(2024-05-01 10:05 UTC)),
            deleted_by: Some(1),
            is_edited: false,
            is_deleted: true,
        };
        let dto = proto::Message::from(msg);
        assert_eq!(dto.sent_at_unix, 1_714_557_600);
        assert_eq!(dto.edited_at_unix, 0);
        assert_eq!(dto.deleted_at_unix, 1_714_557_900);
        assert_eq!(dto.deleted_by, 1);
    }

    #[test]
    fn enums_are_sent_as_upper_case_names() {
        let room = proto::ChatRoom::from(RoomSummary {
            id: 4,
            room_type: RoomType::Private,
            owner_id: None,
            name: "dani & jwan".into(),
        });
        assert_eq!(room.room_type, "PRIVATE");

        let req = proto::FriendRequestDto::from(FriendRequest {
            id: 1,
            sender_id: 1,
            sender_username: "dani".into(),
            receiver_id: 2,
            receiver_username: "jwan".into(),
            status: FriendRequestStatus::Pending,
            created_at: datetime!(2024-05-01 10:00 UTC),
            responded_at: None,
        });
        assert_eq!(req.status, "PENDING");
        assert_eq!(req.responded_at_unix, 0);
    }
}
