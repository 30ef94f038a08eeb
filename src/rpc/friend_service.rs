use tonic::{Request, Response, Status};

use super::convert;
use super::proto::friend_service_server::FriendService;
use super::proto::{
    Empty, FriendListResponse, FriendRequestDto, FriendRequestListResponse,
    ListFriendRequestsRequest, ListFriendsRequest, RemoveFriendRequest,
    RespondFriendRequestRequest, SendFriendRequestRequest,
};
use crate::social::SocialGraph;

pub struct FriendRpc {
    social: SocialGraph,
}

impl FriendRpc {
    pub fn new(social: SocialGraph) -> Self {
        Self { social }
    }
}

#[tonic::async_trait]
impl FriendService for FriendRpc {
    async fn send_friend_request(
        &self,
        request: Request<SendFriendRequestRequest>,
    ) -> Result<Response<FriendRequestDto>, Status> {
        let req = request.into_inner();
        let created = self
            .social
            .send_friend_request(req.requester_id, &req.target_username)
            .await?;
        Ok(Response::new(created.into()))
    }

    async fn respond_friend_request(
        &self,
        request: Request<RespondFriendRequestRequest>,
    ) -> Result<Response<FriendRequestDto>, Status> {
        let req = request.into_inner();
        let updated = self.social.respond_friend_request(req.request_id, req.accept).await?;
        Ok(Response::new(updated.into()))
    }

    async fn list_incoming_requests(
        &self,
        request: Request<ListFriendRequestsRequest>,
    ) -> Result<Response<FriendRequestListResponse>, Status> {
        let pending = self.social.list_incoming_requests(request.into_inner().user_id).await?;
        Ok(Response::new(FriendRequestListResponse {
            requests: convert::all(pending),
        }))
    }

    async fn list_friends(
        &self,
        request: Request<ListFriendsRequest>,
    ) -> Result<Response<FriendListResponse>, Status> {
        let friends = self.social.list_friends(request.into_inner().user_id).await?;
        Ok(Response::new(FriendListResponse {
            friends: convert::all(friends),
        }))
    }

    async fn remove_friend(&self, request: Request<RemoveFriendRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.social.remove_friend(req.user_id, req.friend_id).await?;
        Ok(Response::new(Empty {}))
    }
}
