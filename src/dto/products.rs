use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// Raw product form fields as submitted, before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
}

/// Multipart body accepted by create and update. Documentation only; the
/// handlers read the stream field by field.
#[derive(Debug, ToSchema)]
pub struct ProductMultipart {
    pub name: String,
    #[schema(example = "19.99")]
    pub price: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub photo: Option<Vec<u8>>,
    /// `PUT` or `PATCH` when tunnelling an update through POST.
    pub _method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: Decimal,
    /// Outer `None`: the field was not submitted. Inner `None`: submitted blank.
    pub description: Option<Option<String>>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
