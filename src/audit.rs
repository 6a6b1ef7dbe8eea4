use serde_json::Value;
use strum::AsRefStr;
use uuid::Uuid;

use crate::{error::AppResult, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    UserLogout,
    TokenRefresh,
    ProductCreate,
    ProductUpdate,
    ProductDelete,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
}

impl AuditAction {
    /// Table the action touched.
    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister
            | AuditAction::UserLogin
            | AuditAction::UserLogout
            | AuditAction::TokenRefresh => "users",
            AuditAction::ProductCreate | AuditAction::ProductUpdate | AuditAction::ProductDelete => {
                "products"
            }
            AuditAction::CategoryCreate
            | AuditAction::CategoryUpdate
            | AuditAction::CategoryDelete => "categories",
        }
    }
}

pub async fn log_audit(
    state: &AppState,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Value,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_ref())
    .bind(action.resource())
    .bind(metadata)
    .execute(state.orm.get_postgres_connection_pool())
    .await?;

    Ok(())
}

/// Audit writes never fail the request they describe.
pub async fn record(state: &AppState, user_id: Option<Uuid>, action: AuditAction, metadata: Value) {
    if let Err(err) = log_audit(state, user_id, action, metadata).await {
        tracing::warn!(error = %err, action = action.as_ref(), "audit log failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_are_stored_in_snake_case() {
        assert_eq!(AuditAction::ProductCreate.as_ref(), "product_create");
        assert_eq!(AuditAction::TokenRefresh.as_ref(), "token_refresh");
    }

    #[test]
    fn actions_name_their_table() {
        assert_eq!(AuditAction::UserLogout.resource(), "users");
        assert_eq!(AuditAction::ProductDelete.resource(), "products");
        assert_eq!(AuditAction::CategoryUpdate.resource(), "categories");
    }
}
