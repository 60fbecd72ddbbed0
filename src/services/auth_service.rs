use crate::{
    audit::log_audit,
    dto::auth::{
        ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{AccountProfile, NewAccount, Role},
    response::{ApiResponse, Meta},
    security::password,
    services::{optional, required},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const ALREADY_REGISTERED: &str = "Already registered. Please login.";
const EMAIL_TAKEN: &str = "Email is already taken";

/// Replaces the store's conflict message; a concurrent writer may have won
/// the unique index after our lookup.
fn on_conflict(message: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |err| match err {
        AppError::Conflict(_) => AppError::Conflict(message.into()),
        other => other,
    }
}

fn normalize_email(email: String) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::BadRequest("Email is invalid".into())),
    }
}

fn check_password_strength(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AccountProfile>> {
    let name = required(payload.name, "Name is required")?;
    let email = normalize_email(required(payload.email, "Email is required")?)?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Password is required".into()))?;
    let phone = required(payload.phone, "Phone number is required")?;
    let address = required(payload.address, "Address is required")?;
    let answer = required(payload.answer, "Answer is required")?;
    check_password_strength(&password)?;

    if state.store.find_account_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(ALREADY_REGISTERED.into()));
    }

    let account = state
        .store
        .insert_account(NewAccount {
            name,
            email,
            password_hash: password::hash(&password)?,
            phone,
            address,
            security_answer_hash: password::hash(&answer)?,
            role: Role::Standard,
        })
        .await
        .map_err(on_conflict(ALREADY_REGISTERED))?;

    log_audit(
        state,
        Some(account.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": account.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "User registered. Please login.",
        AccountProfile::from(&account),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let (Some(email), Some(password)) = (optional(payload.email), payload.password) else {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    };
    let email = email.to_lowercase();

    let account = state
        .store
        .find_account_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !password::verify(&password, &account.password_hash) {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.tokens.issue(account.id, account.role)?;

    log_audit(
        state,
        Some(account.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": account.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Login Successful",
        LoginResponse {
            user: AccountProfile::from(&account),
            token,
        },
        Some(Meta::empty()),
    ))
}

/// Reset a password with the recovery answer. The current password is not
/// consulted.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let email = required(payload.email, "Email is required")?.to_lowercase();
    let answer = required(payload.answer, "Answer is required")?;
    let new_password = payload
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("New password is required".into()))?;
    check_password_strength(&new_password)?;

    let wrong = || AppError::Missing("Wrong email or answer".into());
    let mut account = state
        .store
        .find_account_by_email(&email)
        .await?
        .ok_or_else(wrong)?;
    if !password::verify(&answer, &account.security_answer_hash) {
        return Err(wrong());
    }

    account.password_hash = password::hash(&new_password)?;
    let account = state.store.update_account(account).await?;

    log_audit(
        state,
        Some(account.id),
        "password_reset",
        Some("users"),
        None,
    )
    .await;

    Ok(ApiResponse::success(
        "Password reset successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<AccountProfile>> {
    let mut account = state
        .store
        .find_account_by_id(user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        check_password_strength(&password)?;
        account.password_hash = password::hash(&password)?;
    }
    if let Some(email) = optional(payload.email) {
        let email = normalize_email(email)?;
        if email != account.email {
            if state.store.find_account_by_email(&email).await?.is_some() {
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
            account.email = email;
        }
    }
    if let Some(name) = optional(payload.name) {
        account.name = name;
    }
    if let Some(phone) = optional(payload.phone) {
        account.phone = phone;
    }
    if let Some(address) = optional(payload.address) {
        account.address = address;
    }

    let account = state
        .store
        .update_account(account)
        .await
        .map_err(on_conflict(EMAIL_TAKEN))?;

    log_audit(
        state,
        Some(account.id),
        "profile_update",
        Some("users"),
        None,
    )
    .await;

    Ok(ApiResponse::success(
        "User profile updated successfully",
        AccountProfile::from(&account),
        Some(Meta::empty()),
    ))
}
