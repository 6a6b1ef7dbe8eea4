use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header},
};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    entity::RevokedTokens,
    error::AppError,
    models::Role,
    services::token_service,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    /// Identifier of the presented token, used for revocation.
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid Authorization header"))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization scheme"))?;
    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let verified = token_service::verify(&state.config.jwt_secret, token)?;

        let revoked = RevokedTokens::find_by_id(verified.jti)
            .one(&state.orm)
            .await?;
        if revoked.is_some() {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        Ok(AuthUser {
            user_id: verified.user_id,
            role: verified.role,
            jti: verified.jti,
            expires_at: verified.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        let headers = headers("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_foreign_schemes_are_unauthorized() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = bearer_token(&headers("Bearer   ")).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn role_checks() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Moderator,
            jti: Uuid::new_v4(),
            expires_at: Utc::now(),
        };
        assert!(ensure_role(&user, Role::Moderator).is_ok());
        assert_eq!(
            ensure_admin(&user).unwrap_err().status(),
            StatusCode::FORBIDDEN
        );
    }
}
