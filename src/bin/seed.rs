use catalog_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Entity as Categories},
        products::{
            ActiveModel as ProductActive, Column as ProductColumn, Entity as Products,
        },
        users::{ActiveModel as UserActive, Column as UserColumn, Entity as Users},
    },
    models::Role,
    services::auth_service::hash_password,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin", "admin@example.com", "admin12345", Role::Admin).await?;
    let user_id = ensure_user(&orm, "User", "user@example.com", "user12345", Role::User).await?;
    seed_categories(&orm).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserColumn::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let now = Utc::now().fixed_offset();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        role: Set(role.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role})");
    Ok(user.id)
}

async fn seed_categories(orm: &DatabaseConnection) -> anyhow::Result<()> {
    if Categories::find().count(orm).await? > 0 {
        println!("Categories already seeded");
        return Ok(());
    }

    let categories = [
        ("Electronics", 1),
        ("Books", 3),
        ("Home & Kitchen", 5),
        ("Garden", 8),
        ("Clearance", 10),
    ];
    for (name, priority) in categories {
        let now = Utc::now().fixed_offset();
        CategoryActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            priority: Set(priority),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = [
        ("Wireless Mouse", "Two-button mouse with a USB receiver", 2499),
        ("Mechanical Keyboard", "Tenkeyless board with brown switches", 8900),
        ("Rust in Action", "Paperback, first edition", 3950),
        ("Chef's Knife", "20 cm stainless steel blade", 4500),
    ];

    for (name, description, cents) in products {
        let exists = Products::find()
            .filter(ProductColumn::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now().fixed_offset();
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            price: Set(Decimal::new(cents, 2)),
            description: Set(Some(description.to_string())),
            photo_path: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
