use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::{
    dto::auth::{
        ForgotPasswordRequest, GateCheck, LoginRequest, LoginResponse, RegisterRequest,
        UpdateProfileRequest,
    },
    error::AppResult,
    middleware::auth::{AdminUser, AuthUser},
    models::AccountProfile,
    response::ApiResponse,
    routes::orders,
    services::auth_service::{forgot_password, login_user, register_user, update_profile},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot))
        .route("/user-auth", get(user_auth))
        .route("/admin-auth", get(admin_auth))
        .route("/user-profile-update", put(profile_update))
        .merge(orders::router())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<AccountProfile>),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AccountProfile>>)> {
    let resp = register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 404, description = "Wrong email or answer")
    ),
    tag = "Auth"
)]
pub async fn forgot(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = forgot_password(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/user-auth",
    responses(
        (status = 200, description = "Token is valid", body = GateCheck),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn user_auth(_user: AuthUser) -> Json<GateCheck> {
    Json(GateCheck { ok: true })
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/admin-auth",
    responses(
        (status = 200, description = "Caller is an admin", body = GateCheck),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn admin_auth(_admin: AdminUser) -> Json<GateCheck> {
    Json(GateCheck { ok: true })
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/user-profile-update",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<AccountProfile>),
        (status = 400, description = "Invalid field"),
        (status = 409, description = "Email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn profile_update(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<AccountProfile>>> {
    let resp = update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
