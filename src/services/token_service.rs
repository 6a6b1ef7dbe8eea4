use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::{AppError, AppResult},
    models::Role,
};

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub role: Role,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub fn issue(secret: &str, ttl_hours: i64, user_id: Uuid, role: Role) -> AppResult<IssuedToken> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    let jti = Uuid::new_v4();

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        jti: jti.to_string(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(IssuedToken {
        token,
        jti,
        expires_at,
    })
}

pub fn verify(secret: &str, token: &str) -> AppResult<VerifiedToken> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;
    let claims = decoded.claims;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::unauthorized("Invalid user id in token"))?;
    let jti = Uuid::parse_str(&claims.jti)
        .map_err(|_| AppError::unauthorized("Invalid token id"))?;
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
        .ok_or_else(|| AppError::unauthorized("Invalid token expiry"))?;

    Ok(VerifiedToken {
        user_id,
        role: Role::parse_or_user(&claims.role),
        jti,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let user_id = Uuid::new_v4();
        let issued = issue(SECRET, 24, user_id, Role::Admin).unwrap();
        let verified = verify(SECRET, &issued.token).unwrap();
        assert_eq!(verified.user_id, user_id);
        assert_eq!(verified.role, Role::Admin);
        assert_eq!(verified.jti, issued.jti);
        assert_eq!(verified.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn every_token_gets_a_fresh_id() {
        let user_id = Uuid::new_v4();
        let a = issue(SECRET, 1, user_id, Role::User).unwrap();
        let b = issue(SECRET, 1, user_id, Role::User).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_secret_and_expired_tokens_are_rejected() {
        let issued = issue(SECRET, 1, Uuid::new_v4(), Role::User).unwrap();
        let err = verify("other-secret", &issued.token).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let expired = issue(SECRET, -2, Uuid::new_v4(), Role::User).unwrap();
        let err = verify(SECRET, &expired.token).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
