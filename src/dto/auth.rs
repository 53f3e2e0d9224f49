use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PublicUser;

#[derive(Deserialize, Serialize, Debug, Clone, Default, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Raw JWT, sent back as `Authorization: Bearer <token>`.
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}
