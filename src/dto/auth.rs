use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::AccountProfile;

// Fields are optional so that a missing one yields a field-level message
// instead of a generic JSON rejection.

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Answer to the account recovery question.
    pub answer: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: AccountProfile,
    pub token: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    pub answer: Option<String>,
    #[serde(alias = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GateCheck {
    pub ok: bool,
}
