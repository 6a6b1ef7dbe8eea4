use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::categories::{CategoryList, CategoryRequest},
    entity::categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
    error::{AppError, AppResult},
    listing::{CategorySortBy, ListView, Sort, SortOrder},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, PriorityTier},
    response::{ApiResponse, Meta},
    routes::params::{CategoryQuery, list_meta},
    state::AppState,
    validation,
};

/// Categories come back in display order (priority ascending) unless the
/// caller asks for another column.
pub async fn list_categories(
    state: &AppState,
    query: CategoryQuery,
) -> AppResult<ApiResponse<CategoryList>> {
    let all: Vec<Category> = Categories::find()
        .order_by_asc(Column::Priority)
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    let sort = Sort {
        key: query.sort_by.unwrap_or(CategorySortBy::Priority),
        order: query.sort_order.unwrap_or(SortOrder::Asc),
    };
    let view = ListView::new(query.q, Some(sort));
    let (items, meta) = list_meta(&view, all, query.page, query.per_page);

    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let result = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(category_from_entity);
    let result = match result {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Category", result, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let fields = validation::check_new_category(&payload)?;

    let now = Utc::now();
    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(fields.name),
        priority: Set(fields.priority),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::CategoryCreate,
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    let patch = validation::check_category_patch(&payload)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = patch.name {
        active.name = Set(name);
    }
    if let Some(priority) = patch.priority {
        active.priority = Set(priority);
    }
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::CategoryUpdate,
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        AuditAction::CategoryDelete,
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        priority: model.priority,
        priority_tier: PriorityTier::of(model.priority),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
