//! Backend di chat: utenti, amicizie, stanze private e di gruppo, messaggi.
//! Esposto via gRPC (vedi `proto/chat.proto`).

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod membership;
pub mod messages;
pub mod models;
pub mod rooms;
pub mod rpc;
pub mod server;
pub mod social;
pub mod store;

use identity::IdentityDirectory;
use membership::MembershipGovernor;
use messages::MessageGateway;
use rooms::RoomComposer;
use social::SocialGraph;
use store::Store;

/// I motori condividono lo stesso `Store`; nessuno ha stato proprio.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityDirectory,
    pub social: SocialGraph,
    pub rooms: RoomComposer,
    pub governor: MembershipGovernor,
    pub messages: MessageGateway,
}

impl AppState {
    pub fn new(store: Store, bcrypt_cost: u32) -> Self {
        Self {
            identity: IdentityDirectory::new(store.clone(), bcrypt_cost),
            social: SocialGraph::new(store.clone()),
            rooms: RoomComposer::new(store.clone()),
            governor: MembershipGovernor::new(store.clone()),
            messages: MessageGateway::new(store),
        }
    }
}
