use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{extract::State, response::Json, Extension};
use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{
    refresh_token::{self, Entity as RefreshToken},
    user::{self, Entity as User},
};
use crate::error::AppError;
use crate::middleware::auth::{issue_access_token, AuthUser, ACCESS_TOKEN_TTL_SECS};
use crate::routes::response::{ErrorResponse, MessageResponse};
use crate::state::AppState;

const REFRESH_TOKEN_TTL_DAYS: i64 = 1;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    success: bool,
    access_token: String,
    refresh_token: String,
    expires_in: usize,
    user: UserProfile,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    success: bool,
    access_token: String,
    expires_in: usize,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    id: i32,
    username: String,
    created_at: chrono::NaiveDateTime,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

fn generate_refresh_token() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill(&mut random_bytes);
    general_purpose::STANDARD.encode(random_bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = User::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!(username = %payload.username, "login for unknown user");
            invalid_credentials()
        })?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| AppError::InternalServerError(format!("stored hash unreadable: {}", e)))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!(username = %user.username, "password verification failed");
        return Err(invalid_credentials());
    }

    let access_token = issue_access_token(&state.config.jwt_secret, &user)?;

    let refresh_token = generate_refresh_token();
    let now = chrono::Utc::now().naive_utc();
    refresh_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        token_hash: Set(hash_token(&refresh_token)),
        expires_at: Set(now + chrono::Duration::days(REFRESH_TOKEN_TTL_DAYS)),
        created_at: Set(now),
        revoked: Set(false),
    }
    .insert(&state.db)
    .await?;

    info!(username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        access_token,
        refresh_token,
        expires_in: ACCESS_TOKEN_TTL_SECS,
        user: user.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Invalid, revoked or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let token = RefreshToken::find()
        .filter(refresh_token::Column::TokenHash.eq(hash_token(&payload.refresh_token)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token. Please re-login.".to_string()))?;

    if token.revoked {
        return Err(AppError::Unauthorized("User logged out. Please re-login.".to_string()));
    }
    if token.expires_at < chrono::Utc::now().naive_utc() {
        return Err(AppError::Unauthorized("Refresh token expired. Please re-login.".to_string()));
    }

    let user = User::find_by_id(token.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found. Please re-login.".to_string()))?;

    let access_token = issue_access_token(&state.config.jwt_secret, &user)?;
    Ok(Json(RefreshResponse {
        success: true,
        access_token,
        expires_in: ACCESS_TOKEN_TTL_SECS,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Logged out successfully", body = MessageResponse),
        (status = 404, description = "Refresh token not found", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let token = RefreshToken::find()
        .filter(refresh_token::Column::TokenHash.eq(hash_token(&payload.refresh_token)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Refresh token not found".to_string()))?;

    let mut active: refresh_token::ActiveModel = token.into();
    active.revoked = Set(true);
    active.update(&state.db).await?;

    Ok(MessageResponse::ok("Logged out successfully"))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, AppError> {
    let user = User::find_by_id(auth_user.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_random_and_hashed() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a, b);
        assert_eq!(hash_token(&a).len(), 64);
        assert_eq!(hash_token(&a), hash_token(&a));
    }
}
