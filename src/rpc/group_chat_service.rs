use tonic::{Request, Response, Status};

use super::convert;
use super::proto::group_chat_service_server::GroupChatService;
use super::proto::{
    AddMemberRequest, CreateGroupChatRequest, CreateGroupChatResponse, Empty,
    GetPrivateChatRoomRequest, GetPrivateChatRoomResponse, ListMembersRequest,
    ListMembersResponse, ListUserChatRoomsRequest, ListUserChatRoomsResponse,
    PromoteMemberRequest, RemoveMemberRequest,
};
use crate::membership::MembershipGovernor;
use crate::rooms::RoomComposer;

pub struct GroupChatRpc {
    rooms: RoomComposer,
    governor: MembershipGovernor,
}

impl GroupChatRpc {
    pub fn new(rooms: RoomComposer, governor: MembershipGovernor) -> Self {
        Self { rooms, governor }
    }
}

#[tonic::async_trait]
impl GroupChatService for GroupChatRpc {
    async fn create_group_chat(
        &self,
        request: Request<CreateGroupChatRequest>,
    ) -> Result<Response<CreateGroupChatResponse>, Status> {
        let req = request.into_inner();
        // proto3 non distingue tra stringa vuota e assente.
        let description = Some(req.description.as_str()).filter(|d| !d.is_empty());
        let room = self
            .rooms
            .create_group_room(req.owner_id, &req.name, description, &req.member_ids)
            .await?;
        Ok(Response::new(CreateGroupChatResponse {
            room: Some(room.into()),
        }))
    }

    async fn add_member(&self, request: Request<AddMemberRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.governor
            .add_member(req.chat_room_id, req.requester_id, req.user_id)
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn remove_member(&self, request: Request<RemoveMemberRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.governor
            .remove_member(req.chat_room_id, req.requester_id, req.user_id)
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn promote_member(&self, request: Request<PromoteMemberRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.governor
            .promote_member(req.chat_room_id, req.requester_id, req.user_id)
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn list_members(
        &self,
        request: Request<ListMembersRequest>,
    ) -> Result<Response<ListMembersResponse>, Status> {
        let members = self.governor.list_members(request.into_inner().chat_room_id).await?;
        Ok(Response::new(ListMembersResponse {
            members: convert::all(members),
        }))
    }

    async fn list_user_chat_rooms(
        &self,
        request: Request<ListUserChatRoomsRequest>,
    ) -> Result<Response<ListUserChatRoomsResponse>, Status> {
        let rooms = self.governor.list_user_group_rooms(request.into_inner().user_id).await?;
        Ok(Response::new(ListUserChatRoomsResponse {
            rooms: convert::all(rooms),
        }))
    }

    async fn get_private_chat_room(
        &self,
        request: Request<GetPrivateChatRoomRequest>,
    ) -> Result<Response<GetPrivateChatRoomResponse>, Status> {
        let req = request.into_inner();
        let room = self.rooms.get_private_room(req.user_id1, req.user_id2).await?;
        Ok(Response::new(GetPrivateChatRoomResponse {
            room: Some(room.into()),
        }))
    }
}
