use tonic::{Request, Response, Status};

use super::convert;
use super::proto::chat_service_server::ChatService;
use super::proto::{
    CreateChatRoomRequest, CreateChatRoomResponse, DeleteMessageRequest, EditMessageRequest,
    Empty, GetMessagesRequest, GetMessagesResponse, ListChatRoomsResponse, Message,
    SearchMessagesRequest, SendMessageRequest, SendMessageResponse,
};
use crate::messages::{validate_text, MessageGateway};
use crate::rooms::RoomComposer;

pub struct ChatRpc {
    messages: MessageGateway,
    rooms: RoomComposer,
}

impl ChatRpc {
    pub fn new(messages: MessageGateway, rooms: RoomComposer) -> Self {
        Self { messages, rooms }
    }
}

#[tonic::async_trait]
impl ChatService for ChatRpc {
    async fn send_message(
        &self,
        request: Request<SendMessageRequest>,
    ) -> Result<Response<SendMessageResponse>, Status> {
        let req = request.into_inner();
        let text = validate_text(&req.text)?;
        let message = self.messages.send(req.chat_room_id, req.sender_id, text).await?;
        Ok(Response::new(SendMessageResponse {
            message: Some(message.into()),
        }))
    }

    async fn get_messages(
        &self,
        request: Request<GetMessagesRequest>,
    ) -> Result<Response<GetMessagesResponse>, Status> {
        let history = self.messages.list_by_room(request.into_inner().chat_room_id).await?;
        Ok(Response::new(GetMessagesResponse {
            messages: convert::all(history),
        }))
    }

    async fn list_chat_rooms(&self, _request: Request<Empty>) -> Result<Response<ListChatRoomsResponse>, Status> {
        let rooms = self.rooms.list_rooms().await?;
        Ok(Response::new(ListChatRoomsResponse {
            rooms: convert::all(rooms),
        }))
    }

    async fn edit_message(&self, request: Request<EditMessageRequest>) -> Result<Response<Message>, Status> {
        let req = request.into_inner();
        let edited = self.messages.edit(req.message_id, req.sender_id, &req.text).await?;
        Ok(Response::new(edited.into()))
    }

    async fn delete_message(&self, request: Request<DeleteMessageRequest>) -> Result<Response<Message>, Status> {
        let req = request.into_inner();
        let deleted = self.messages.delete(req.message_id, req.requester_id).await?;
        Ok(Response::new(deleted.into()))
    }

    async fn search_messages(
        &self,
        request: Request<SearchMessagesRequest>,
    ) -> Result<Response<GetMessagesResponse>, Status> {
        let req = request.into_inner();
        let found = self.messages.search(req.chat_room_id, &req.query).await?;
        Ok(Response::new(GetMessagesResponse {
            messages: convert::all(found),
        }))
    }

    async fn create_chat_room(
        &self,
        request: Request<CreateChatRoomRequest>,
    ) -> Result<Response<CreateChatRoomResponse>, Status> {
        let room = self.rooms.create_lobby_room(&request.into_inner().name).await?;
        Ok(Response::new(CreateChatRoomResponse {
            room: Some(room.into()),
        }))
    }
}
