use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: usize = 900;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: i32,
    pub exp: usize,
}

pub fn issue_access_token(secret: &str, user: &user::Model) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.username.clone(),
        uid: user.id,
        exp: chrono::Utc::now().timestamp() as usize + ACCESS_TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("token encode failed: {}", e)))
}

pub fn verify_access_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("JWT decode error: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    Ok(AuthUser {
        id: data.claims.uid,
        username: data.claims.sub,
    })
}

/// Requires `Authorization: Bearer <access token>` and exposes the caller as an
/// [`AuthUser`] request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let auth_user = verify_access_token(&state.config.jwt_secret, token.trim())?;
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> user::Model {
        user::Model {
            id: 7,
            username: "admin".into(),
            password: String::new(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let token = issue_access_token("s3cret", &user()).unwrap();
        let auth = verify_access_token("s3cret", &token).unwrap();
        assert_eq!(auth.id, 7);
        assert_eq!(auth.username, "admin");
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = issue_access_token("s3cret", &user()).unwrap();
        assert!(matches!(
            verify_access_token("other", &token),
            Err(AppError::Unauthorized(_))
        ));
    }
}
