use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("The given data was invalid")]
    Validation(#[from] ValidationErrors),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Storage error")]
    Storage(#[from] std::io::Error),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

#[derive(Serialize)]
struct ValidationData {
    errors: BTreeMap<String, Vec<String>>,
}

/// Flattens validator output into `field -> [messages]`, falling back to the
/// rule code when a rule carries no message.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let body = match &self {
            AppError::Validation(errors) => axum::Json(ApiResponse {
                message,
                data: Some(serde_json::to_value(ValidationData {
                    errors: field_messages(errors),
                })
                .unwrap_or_default()),
                meta: Some(Meta::empty()),
            }),
            _ => axum::Json(ApiResponse {
                message: message.clone(),
                data: Some(serde_json::to_value(ErrorData { error: message }).unwrap_or_default()),
                meta: Some(Meta::empty()),
            }),
        };

        (status, body).into_response()
    }
}

/// Well-formed JSON of the wrong shape (missing or mistyped fields) is a 422
/// under `body`; unreadable JSON or the wrong content type is a 400.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "body",
                    ValidationError::new("json").with_message(err.body_text().into()),
                );
                AppError::Validation(errors)
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_unprocessable_entity() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "name",
            ValidationError::new("required").with_message("Product name is required".into()),
        );
        let err = AppError::from(errors);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let AppError::Validation(inner) = &err else {
            panic!("expected validation error");
        };
        let messages = field_messages(inner);
        assert_eq!(messages["name"], vec!["Product name is required".to_string()]);
    }

    #[test]
    fn auth_errors_use_client_statuses() {
        assert_eq!(AppError::unauthorized("nope").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn json_shape_errors_become_field_errors() {
        use axum::{Json, body::Body, extract::FromRequest, http::Request};

        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Login {
            email: String,
            password: String,
        }

        let missing_field = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"a@b.c"}"#))
            .unwrap();
        let rejection = Json::<Login>::from_request(missing_field, &()).await.unwrap_err();
        let err = AppError::from(rejection);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let AppError::Validation(inner) = &err else {
            panic!("expected validation error");
        };
        assert!(field_messages(inner).contains_key("body"));

        let garbage = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = Json::<Login>::from_request(garbage, &()).await.unwrap_err();
        assert_eq!(AppError::from(rejection).status(), StatusCode::BAD_REQUEST);
    }
}
