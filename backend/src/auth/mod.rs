use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use crates::domain::value_objects::enums::user_roles::UserRole;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{axum_http::error_responses::AppError, config::config_loader};

/// HS256 access token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthUser {
    /// Fails with 403 unless the caller holds one of `allowed`.
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }

        warn!(
            user_id = %self.user_id,
            role = %self.role,
            "auth: role not allowed for route"
        );
        Err(AppError::Forbidden)
    }
}

pub fn decode_access_token(token: &str, secret: &str) -> anyhow::Result<AccessClaims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<AccessClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

pub fn validate_access_token(token: &str) -> anyhow::Result<AuthUser> {
    let secret = config_loader::get_auth_secret()?.jwt_secret;
    let claims = decode_access_token(token, &secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| anyhow::anyhow!("Invalid user ID in token"))?;
    let role = UserRole::from_str(&claims.role)
        .ok_or_else(|| anyhow::anyhow!("Unknown role in token"))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Missing or malformed bearer token".into()))?;

        validate_access_token(bearer.token()).map_err(|err| {
            warn!(error = %err, "auth: access token rejected");
            AppError::Unauthorized(err.to_string())
        })
    }
}

#[cfg(test)]
mod tests;
