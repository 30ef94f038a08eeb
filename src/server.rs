use std::future::Future;
use std::net::SocketAddr;

use tonic::codegen::http;
use tonic::transport::Server;
use uuid::Uuid;

use crate::rpc::proto::chat_service_server::ChatServiceServer;
use crate::rpc::proto::friend_service_server::FriendServiceServer;
use crate::rpc::proto::group_chat_service_server::GroupChatServiceServer;
use crate::rpc::proto::user_service_server::UserServiceServer;
use crate::rpc::{ChatRpc, FriendRpc, GroupChatRpc, UserRpc};
use crate::AppState;

/// Ogni chiamata gira dentro uno span con un id univoco.
fn request_span(req: &http::Request<()>) -> tracing::Span {
    tracing::info_span!(
        "grpc",
        request_id = %Uuid::new_v4(),
        path = %req.uri().path(),
    )
}

/// Avvia i quattro servizi sullo stesso indirizzo finché `shutdown` non
/// si completa.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()>,
) -> Result<(), tonic::transport::Error> {
    let AppState {
        identity,
        social,
        rooms,
        governor,
        messages,
    } = state;

    tracing::info!("gRPC server listening on {}", addr);

    Server::builder()
        .trace_fn(request_span)
        .add_service(UserServiceServer::new(UserRpc::new(identity)))
        .add_service(FriendServiceServer::new(FriendRpc::new(social)))
        .add_service(GroupChatServiceServer::new(GroupChatRpc::new(rooms.clone(), governor)))
        .add_service(ChatServiceServer::new(ChatRpc::new(messages, rooms)))
        .serve_with_shutdown(addr, shutdown)
        .await
}

/// Si completa alla ricezione di Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
