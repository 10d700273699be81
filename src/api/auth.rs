//! Account endpoints: signup, login, password reset and role management

use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{
        LoginRequest, ResetPasswordRequest, Role, SignupRequest, UpdateRoleRequest, UserSummary,
    },
    AppState,
};

use super::{AuthenticatedUser, Json, MessageResponse};

/// Login response carrying the session token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub email_id: String,
    pub name: String,
    pub role: Role,
    pub token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown email", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .auth
        .login(&request.email_id, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        email_id: user.email_id,
        name: user.name,
        role: user.role,
        token,
        token_type: "Bearer".to_string(),
    }))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = MessageResponse),
        (status = 400, description = "Blank field", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.signup(request).await?;
    Ok(Json(MessageResponse::new("Signup successful")))
}

/// Overwrite the password of an account
#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 404, description = "Email not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.reset_password(request).await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}

/// List all accounts (admin only)
#[utoipa::path(
    get,
    path = "/list-users",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UsersResponse>> {
    state.services.auth.require_admin(&claims).await?;

    let users = state.services.auth.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// Change the role of an account (admin only)
#[utoipa::path(
    post,
    path = "/update-role",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateRoleRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.require_admin(&claims).await?;

    state
        .services
        .auth
        .update_role(&request.email_id, request.role)
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Role of {} set to {}",
        request.email_id, request.role
    ))))
}
