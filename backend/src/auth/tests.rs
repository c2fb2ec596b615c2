use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::env;

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn set_env_vars() {
    unsafe {
        env::set_var("JWT_SECRET", SECRET);
    }
}

fn token(secret: &str, role: &str, exp: usize) -> String {
    let claims = AccessClaims {
        sub: USER_ID.to_string(),
        role: role.to_string(),
        email: Some("test@example.com".to_string()),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_decode_access_token_success() {
    let claims = decode_access_token(&token(SECRET, "provider", 9999999999), SECRET)
        .expect("Valid token should pass");

    assert_eq!(claims.sub, USER_ID);
    assert_eq!(claims.role, "provider");
    assert_eq!(claims.email.as_deref(), Some("test@example.com"));
}

#[test]
fn test_decode_access_token_expired() {
    let result = decode_access_token(&token(SECRET, "customer", 1), SECRET);
    assert!(result.is_err());
}

#[test]
fn test_decode_access_token_invalid_signature() {
    let result = decode_access_token(&token("wrongsecret", "customer", 9999999999), SECRET);
    assert!(result.is_err());
}

#[test]
fn test_validate_access_token_maps_role() {
    set_env_vars();

    let user = validate_access_token(&token(SECRET, "admin", 9999999999)).unwrap();
    assert_eq!(user.user_id.to_string(), USER_ID);
    assert_eq!(user.role, UserRole::Admin);
}

#[test]
fn test_validate_access_token_rejects_unknown_role() {
    set_env_vars();

    assert!(validate_access_token(&token(SECRET, "authenticated", 9999999999)).is_err());
}

#[test]
fn test_require_role() {
    let user = AuthUser {
        user_id: Uuid::new_v4(),
        email: None,
        role: UserRole::Customer,
    };

    assert!(user.require_role(&[UserRole::Customer, UserRole::Provider]).is_ok());
    assert!(matches!(
        user.require_role(&[UserRole::Admin]),
        Err(AppError::Forbidden)
    ));
}
