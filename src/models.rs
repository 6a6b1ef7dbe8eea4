use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Moderator,
}

impl Role {
    /// Unknown stored roles degrade to the least privileged one.
    pub fn parse_or_user(raw: &str) -> Self {
        raw.parse().unwrap_or(Role::User)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Landing page after authentication.
    pub fn home_path(&self) -> &'static str {
        if self.is_admin() {
            "/admin/dashboard"
        } else {
            "/"
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub description: Option<String>,
    pub photo_path: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn of(priority: i32) -> Self {
        match priority {
            i32::MIN..=3 => PriorityTier::High,
            4..=6 => PriorityTier::Medium,
            _ => PriorityTier::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub priority: i32,
    pub priority_tier: PriorityTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
