use axum::body::Bytes;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    audit::{self, AuditAction},
    dto::products::{ProductFields, ProductInput, ProductList},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    listing::{ListView, Sort, SortOrder, ProductSortBy},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, list_meta},
    state::AppState,
    storage::{ImageKind, PhotoStorage, UploadedPhoto},
    validation,
};

/// A product form that passed validation, with its photo already inspected.
struct Submission {
    fields: ProductFields,
    photo: Option<(ImageKind, Bytes)>,
}

fn validate_submission(
    storage: &PhotoStorage,
    input: &ProductInput,
    photo: Option<UploadedPhoto>,
) -> AppResult<Submission> {
    let mut errors = ValidationErrors::new();
    let fields = validation::product_fields(input, &mut errors);
    let photo = match photo {
        Some(photo) => match storage.inspect(&photo) {
            Ok(kind) => Some((kind, photo.bytes)),
            Err(err) => {
                errors.add("photo", err);
                None
            }
        },
        None => None,
    };
    match fields {
        Some(fields) if errors.is_empty() => Ok(Submission { fields, photo }),
        _ => Err(errors.into()),
    }
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let all: Vec<Product> = Products::find()
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| product_from_entity(&state.storage, m))
        .collect();

    let sort = match (query.sort_by, query.sort_order) {
        (None, None) => None,
        (key, order) => Some(Sort {
            key: key.unwrap_or(ProductSortBy::CreatedAt),
            order: order.unwrap_or(SortOrder::Asc),
        }),
    };
    let view = ListView::new(query.q, sort);
    let (items, meta) = list_meta(&view, all, query.page, query.per_page);

    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|m| product_from_entity(&state.storage, m));
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    input: ProductInput,
    photo: Option<UploadedPhoto>,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let Submission { fields, photo } = validate_submission(&state.storage, &input, photo)?;

    let photo_path = match photo {
        Some((kind, bytes)) => Some(state.storage.store(kind, &bytes).await?),
        None => None,
    };

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(fields.name),
        price: Set(fields.price),
        description: Set(fields.description.flatten()),
        photo_path: Set(photo_path.clone()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = match active.insert(&state.orm).await {
        Ok(product) => product,
        Err(err) => {
            if let Some(path) = &photo_path {
                state.storage.delete(path).await;
            }
            return Err(err.into());
        }
    };

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::ProductCreate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(&state.storage, product),
        Some(Meta::empty()),
    ))
}

/// Name and price are required on every update. The description changes only
/// when submitted; a new photo replaces and deletes the old one.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    input: ProductInput,
    photo: Option<UploadedPhoto>,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let Submission { fields, photo } = validate_submission(&state.storage, &input, photo)?;

    let old_photo = existing.photo_path.clone();
    let new_photo = match photo {
        Some((kind, bytes)) => Some(state.storage.store(kind, &bytes).await?),
        None => None,
    };

    let mut active: ActiveModel = existing.into();
    active.name = Set(fields.name);
    active.price = Set(fields.price);
    if let Some(description) = fields.description {
        active.description = Set(description);
    }
    if let Some(path) = &new_photo {
        active.photo_path = Set(Some(path.clone()));
    }
    active.updated_at = Set(Utc::now().into());

    let product = match active.update(&state.orm).await {
        Ok(product) => product,
        Err(err) => {
            if let Some(path) = &new_photo {
                state.storage.delete(path).await;
            }
            return Err(err.into());
        }
    };

    if let (Some(_), Some(old)) = (&new_photo, &old_photo) {
        state.storage.delete(old).await;
    }

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id, "photo_replaced": new_photo.is_some() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(&state.storage, product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Some(path) = &existing.photo_path {
        state.storage.delete(path).await;
    }

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::ProductDelete,
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(storage: &PhotoStorage, model: ProductModel) -> Product {
    let photo_url = model.photo_path.as_deref().map(|path| storage.url(path));
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        description: model.description,
        photo_path: model.photo_path,
        photo_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
