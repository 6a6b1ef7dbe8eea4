use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    audit::{self, AuditAction},
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest},
    entity::{
        RevokedTokens, Users,
        revoked_tokens::{self, ActiveModel as RevokedActive},
        users::{self, ActiveModel as UserActive, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::token_service,
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let exist = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "email",
            ValidationError::new("unique").with_message("Email is already taken".into()),
        );
        return Err(errors.into());
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(Role::User.to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    let user = user_from_entity(user);

    audit::record(
        state,
        Some(user.id),
        AuditAction::UserRegister,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = issue_for(state, user)?;
    Ok(ApiResponse::success("User created", resp, Some(Meta::empty())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let user = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::unauthorized("Invalid email or password")),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let user = user_from_entity(user);
    audit::record(
        state,
        Some(user.id),
        AuditAction::UserLogin,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = issue_for(state, user)?;
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Revoke the presented token. Revoking twice is harmless.
pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    revoke(state, user).await?;

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::UserLogout,
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let found = load_user(state, user.user_id).await?;
    Ok(ApiResponse::success("Current user", found, None))
}

/// Swap the presented token for a fresh one.
pub async fn refresh_token(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AuthResponse>> {
    let found = load_user(state, user.user_id).await?;
    revoke(state, user).await?;
    audit::record(
        state,
        Some(user.user_id),
        AuditAction::TokenRefresh,
        serde_json::json!({ "revoked_jti": user.jti }),
    )
    .await;
    let resp = issue_for(state, found)?;
    Ok(ApiResponse::success("Token refreshed", resp, Some(Meta::empty())))
}

async fn load_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .map(user_from_entity)
        .ok_or_else(|| AppError::unauthorized("User no longer exists"))
}

async fn revoke(state: &AppState, user: &AuthUser) -> AppResult<()> {
    let now = Utc::now();
    let record = RevokedActive {
        jti: Set(user.jti),
        user_id: Set(user.user_id),
        expires_at: Set(user.expires_at.into()),
        revoked_at: Set(now.into()),
    };
    RevokedTokens::insert(record)
        .on_conflict(
            OnConflict::column(revoked_tokens::Column::Jti)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    // Expired tokens fail verification anyway, so their revocations can go.
    let purged = RevokedTokens::delete_many()
        .filter(revoked_tokens::Column::ExpiresAt.lt(now))
        .exec(&state.orm)
        .await?;
    if purged.rows_affected > 0 {
        tracing::debug!(purged = purged.rows_affected, "expired revocations removed");
    }
    Ok(())
}

fn issue_for(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let issued = token_service::issue(
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
        user.id,
        user.role,
    )?;
    Ok(AuthResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
        redirect_to: user.home_path().to_string(),
        user,
    })
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        role: Role::parse_or_user(&model.role),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
