//! Request body extractors for the admin forms: multipart (with an optional
//! photo), url-encoded, and for categories plain JSON. A `_method` field lets
//! a POST stand in for PUT or PATCH.

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::{Method, header},
};

use crate::{
    dto::{
        categories::{CategoryRequest, NumberInput},
        products::ProductInput,
    },
    error::{AppError, AppResult},
    storage::UploadedPhoto,
};

pub const METHOD_FIELD: &str = "_method";
pub const PHOTO_FIELD: &str = "photo";

fn content_type(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

fn is_multipart(req: &Request) -> bool {
    content_type(req).is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

fn is_urlencoded(req: &Request) -> bool {
    content_type(req).is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    photo: Option<UploadedPhoto>,
}

impl FormData {
    pub fn new(fields: HashMap<String, String>, photo: Option<UploadedPhoto>) -> Self {
        Self { fields, photo }
    }

    async fn read_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == PHOTO_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    form.photo = Some(UploadedPhoto {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn take_photo(&mut self) -> Option<UploadedPhoto> {
        self.photo.take()
    }

    /// The tunnelled method, if the form carried one.
    pub fn method_override(&self) -> AppResult<Option<Method>> {
        method_override(self.fields.get(METHOD_FIELD).map(String::as_str))
    }
}

/// Only PUT and PATCH may be tunnelled through POST.
pub fn method_override(raw: Option<&str>) -> AppResult<Option<Method>> {
    match raw.map(|m| m.trim().to_ascii_uppercase()) {
        None => Ok(None),
        Some(m) if m == "PUT" => Ok(Some(Method::PUT)),
        Some(m) if m == "PATCH" => Ok(Some(Method::PATCH)),
        Some(_) => Err(AppError::MethodNotAllowed),
    }
}

/// POST routes that update a resource insist on `_method=PUT|PATCH`.
pub fn require_update_override(method: Option<Method>) -> AppResult<()> {
    match method {
        Some(_) => Ok(()),
        None => Err(AppError::MethodNotAllowed),
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            FormData::read_multipart(multipart).await
        } else if is_urlencoded(&req) {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(FormData::new(fields, None))
        } else {
            Err(AppError::BadRequest(
                "Expected a multipart/form-data or application/x-www-form-urlencoded body".into(),
            ))
        }
    }
}

/// `Json<T>` whose rejections come back in the usual error envelope.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

#[derive(Debug)]
pub struct ProductPayload {
    pub input: ProductInput,
    pub photo: Option<UploadedPhoto>,
    pub method: Option<Method>,
}

impl From<FormData> for ProductPayload {
    fn from(mut form: FormData) -> Self {
        // an invalid override is reported by the handler that cares about it
        let method = form.method_override().ok().flatten();
        Self {
            input: ProductInput {
                name: form.take("name"),
                price: form.take("price"),
                description: form.take("description"),
            },
            photo: form.take_photo(),
            method,
        }
    }
}

impl<S> FromRequest<S> for ProductPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = FormData::from_request(req, state).await?;
        form.method_override()?;
        Ok(form.into())
    }
}

#[derive(Debug)]
pub struct CategoryPayload {
    pub request: CategoryRequest,
    pub method: Option<Method>,
}

impl<S> FromRequest<S> for CategoryPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) || is_urlencoded(&req) {
            let mut form = FormData::from_request(req, state).await?;
            let method = form.method_override()?;
            return Ok(Self {
                request: CategoryRequest {
                    name: form.take("name"),
                    priority: form.take("priority").map(NumberInput::Text),
                },
                method,
            });
        }

        let ApiJson(request) = ApiJson::<CategoryRequest>::from_request(req, state).await?;
        Ok(Self {
            request,
            method: None,
        })
    }
}
