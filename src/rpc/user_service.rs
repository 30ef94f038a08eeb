use tonic::{Request, Response, Status};

use super::proto::user_service_server::UserService;
use super::proto::{
    GetUserRequest, GetUserResponse, LoginRequest, LoginResponse, RegisterUserRequest,
    RegisterUserResponse,
};
use crate::identity::IdentityDirectory;

pub struct UserRpc {
    identity: IdentityDirectory,
}

impl UserRpc {
    pub fn new(identity: IdentityDirectory) -> Self {
        Self { identity }
    }
}

#[tonic::async_trait]
impl UserService for UserRpc {
    async fn register_user(
        &self,
        request: Request<RegisterUserRequest>,
    ) -> Result<Response<RegisterUserResponse>, Status> {
        let req = request.into_inner();
        let user = self.identity.register(&req.username, &req.password).await?;
        Ok(Response::new(RegisterUserResponse {
            user: Some(user.into()),
        }))
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();
        let user = self.identity.login(&req.username, &req.password).await?;
        Ok(Response::new(LoginResponse {
            user: Some(user.into()),
        }))
    }

    async fn get_user(&self, request: Request<GetUserRequest>) -> Result<Response<GetUserResponse>, Status> {
        let user = self.identity.get(request.into_inner().user_id).await?;
        Ok(Response::new(GetUserResponse {
            user: Some(user.into()),
        }))
    }
}
