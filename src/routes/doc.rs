use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        categories::{CategoryList, CategoryRequest},
        products::{ProductList, ProductMultipart},
    },
    listing::{CategorySortBy, ProductSortBy, SortOrder},
    models::{Category, PriorityTier, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::{auth, categories, health, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::refresh_token,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::update_product_via_post,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::update_category_via_post,
        categories::delete_category,
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            Category,
            PriorityTier,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ProductMultipart,
            ProductList,
            CategoryRequest,
            CategoryList,
            ProductSortBy,
            CategorySortBy,
            SortOrder,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Category>,
            ApiResponse<CategoryList>,
            ApiResponse<AuthResponse>,
            ApiResponse<User>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Categories", description = "Category endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
