use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Category;

/// A number that may arrive as JSON number or as form text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumberInput {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumberInput::Number(n) => n.as_i64(),
            NumberInput::Text(t) => t.trim().parse().ok(),
        }
    }
}

impl From<i32> for NumberInput {
    fn from(value: i32) -> Self {
        NumberInput::Number(value.into())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CategoryRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<i32>, minimum = 1, maximum = 10)]
    pub priority: Option<NumberInput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFields {
    pub name: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
