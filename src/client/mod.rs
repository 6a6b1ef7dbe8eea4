//! Typed HTTP client for the catalog API, with the same local checks and
//! session handling as the browser front end.

pub mod session;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use reqwest::{Method, RequestBuilder, multipart};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        categories::CategoryRequest,
        products::ProductInput,
    },
    error::field_messages,
    listing::SortOrder,
    models::{Category, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::form::{METHOD_FIELD, PHOTO_FIELD},
    storage::UploadedPhoto,
    validation::{check_category_patch, check_new_category, check_product_form},
};

pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the given data was invalid")]
    Validation(BTreeMap<String, Vec<String>>),
    #[error("server responded {status}: {message}")]
    Http { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("session storage failed: {0}")]
    Session(#[from] std::io::Error),
    #[error("session data is corrupt: {0}")]
    SessionFormat(#[from] serde_json::Error),
    #[error("not signed in")]
    NotAuthenticated,
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ClientError::Validation(field_messages(&errors))
    }
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Validation(_) => Some(422),
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Query for list endpoints. Leave `page` and `per_page` unset to get the
/// whole collection and page locally.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
}

impl CatalogClient {
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn session(&self) -> Result<Session, ClientError> {
        self.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().is_some_and(|u| u.is_admin())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.current_user().is_some_and(|u| u.role == role)
    }

    fn current_user(&self) -> Option<User> {
        let session = self.store.load().ok()?;
        session.authenticated_user().cloned()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let builder = self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::ACCEPT, "application/json");
        match self.store.load()?.token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: Option<ApiResponse<ErrorBody>> = response.json().await.ok();
        let (message, errors) = match body {
            Some(b) => (b.message, b.data.and_then(|d| d.errors)),
            None => (
                status.canonical_reason().unwrap_or("request failed").to_string(),
                None,
            ),
        };
        match errors {
            Some(errors) if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ClientError::Validation(errors))
            }
            _ => Err(ClientError::Http {
                status: status.as_u16(),
                message,
            }),
        }
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let body = self.send::<T>(builder).await?;
        body.data.ok_or_else(|| ClientError::Http {
            status: 200,
            message: "response carried no data".to_string(),
        })
    }

    // ---- auth ----

    pub async fn register(&self, req: &RegisterRequest) -> Result<User, ClientError> {
        req.validate()?;
        let auth: AuthResponse = self
            .data(self.request(Method::POST, "/register")?.json(req))
            .await?;
        self.remember(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        req.validate()?;
        let auth: AuthResponse = self
            .data(self.request(Method::POST, "/login")?.json(&req))
            .await?;
        self.remember(auth)
    }

    fn remember(&self, auth: AuthResponse) -> Result<User, ClientError> {
        let session = Session {
            token: Some(auth.token),
            user: Some(auth.user.clone()),
        };
        self.store.save(&session)?;
        Ok(auth.user)
    }

    /// Tells the server to revoke the token, then forgets it locally no matter
    /// what the server said.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let session = self.store.load().unwrap_or_default();
        if session.token.is_some() {
            let outcome = match self.request(Method::POST, "/logout") {
                Ok(builder) => self.send::<serde_json::Value>(builder).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "server logout failed, clearing session anyway");
            }
        }
        self.store.clear()
    }

    /// Re-reads the signed-in user from the server. Any failure ends the session.
    pub async fn refresh_user(&self) -> Result<User, ClientError> {
        let session = self.store.load()?;
        if session.token.is_none() {
            return Err(ClientError::NotAuthenticated);
        }

        let fetched = match self.request(Method::GET, "/me") {
            Ok(builder) => self.data::<User>(builder).await,
            Err(e) => Err(e),
        };
        match fetched {
            Ok(user) => {
                self.store.save(&Session {
                    token: session.token,
                    user: Some(user.clone()),
                })?;
                Ok(user)
            }
            Err(e) => {
                self.logout().await?;
                Err(e)
            }
        }
    }

    /// Swaps the stored token for a fresh one.
    pub async fn refresh_token(&self) -> Result<User, ClientError> {
        let auth: AuthResponse = self
            .data(self.request(Method::POST, "/refresh-token")?)
            .await?;
        self.remember(auth)
    }

    // ---- products ----

    pub async fn list_products(
        &self,
        params: &ListParams,
    ) -> Result<(Vec<Product>, Option<Meta>), ClientError> {
        let body = self
            .send::<Vec<Product>>(self.request(Method::GET, "/products")?.query(params))
            .await?;
        Ok((body.data.unwrap_or_default(), body.meta))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, ClientError> {
        self.data(self.request(Method::GET, &format!("/products/{id}"))?)
            .await
    }

    pub async fn create_product(
        &self,
        input: &ProductInput,
        photo: Option<UploadedPhoto>,
    ) -> Result<Product, ClientError> {
        check_product_form(input)?;
        let form = product_form(input, photo, None)?;
        self.data(self.request(Method::POST, "/products")?.multipart(form))
            .await
    }

    /// Sent as POST with `_method=PUT` so the photo can ride along in the
    /// multipart body.
    pub async fn update_product(
        &self,
        id: Uuid,
        input: &ProductInput,
        photo: Option<UploadedPhoto>,
    ) -> Result<Product, ClientError> {
        check_product_form(input)?;
        let form = product_form(input, photo, Some("PUT"))?;
        self.data(
            self.request(Method::POST, &format!("/products/{id}"))?
                .multipart(form),
        )
        .await
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(self.request(Method::DELETE, &format!("/products/{id}"))?)
            .await?;
        Ok(())
    }

    // ---- categories ----

    pub async fn list_categories(
        &self,
        params: &ListParams,
    ) -> Result<(Vec<Category>, Option<Meta>), ClientError> {
        let body = self
            .send::<Vec<Category>>(self.request(Method::GET, "/categories")?.query(params))
            .await?;
        Ok((body.data.unwrap_or_default(), body.meta))
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category, ClientError> {
        self.data(self.request(Method::GET, &format!("/categories/{id}"))?)
            .await
    }

    pub async fn create_category(&self, req: &CategoryRequest) -> Result<Category, ClientError> {
        check_new_category(req)?;
        self.data(self.request(Method::POST, "/categories")?.json(req))
            .await
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        req: &CategoryRequest,
    ) -> Result<Category, ClientError> {
        check_category_patch(req)?;
        self.data(
            self.request(Method::PUT, &format!("/categories/{id}"))?
                .json(req),
        )
        .await
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(
            self.request(Method::DELETE, &format!("/categories/{id}"))?,
        )
        .await?;
        Ok(())
    }
}

fn product_form(
    input: &ProductInput,
    photo: Option<UploadedPhoto>,
    method: Option<&str>,
) -> Result<multipart::Form, ClientError> {
    let mut form = multipart::Form::new();
    if let Some(name) = &input.name {
        form = form.text("name", name.clone());
    }
    if let Some(price) = &input.price {
        form = form.text("price", price.clone());
    }
    if let Some(description) = &input.description {
        form = form.text("description", description.clone());
    }
    if let Some(method) = method {
        form = form.text(METHOD_FIELD, method.to_string());
    }
    if let Some(photo) = photo {
        let mut part = multipart::Part::bytes(photo.bytes.to_vec());
        if let Some(file_name) = photo.file_name {
            part = part.file_name(file_name);
        }
        if let Some(content_type) = photo.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        form = form.part(PHOTO_FIELD, part);
    }
    Ok(form)
}
