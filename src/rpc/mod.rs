//! Facciata gRPC: traduce le richieste nei metodi dei motori e gli errori in
//! `tonic::Status`. Nessuna logica di dominio qui.

pub mod chat_service;
pub mod convert;
pub mod friend_service;
pub mod group_chat_service;
pub mod user_service;

pub mod proto {
    tonic::include_proto!("chat");
}

pub use chat_service::ChatRpc;
pub use friend_service::FriendRpc;
pub use group_chat_service::GroupChatRpc;
pub use user_service::UserRpc;
