use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tourism_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        sea_orm_active_enums::{Role, UserStatus},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    services::auth_service::hash_password,
};
use uuid::Uuid;

const CATEGORIES: [&str; 4] = ["Restaurant", "Hotel", "Shopping Mall", "Entertainment"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    seed_categories(&orm).await?;

    let email = std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let admin_id = ensure_admin(&orm, &email, &password).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn seed_categories(orm: &DatabaseConnection) -> anyhow::Result<()> {
    for name in CATEGORIES {
        let exists = Categories::find()
            .filter(CategoryCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        CategoryActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
        }
        .insert(orm)
        .await?;
        println!("Seeded category {name}");
    }
    Ok(())
}

async fn ensure_admin(orm: &DatabaseConnection, email: &str, password: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        let mut active: UserActive = existing.into();
        active.role = Set(Role::Admin);
        let user = active.update(orm).await?;
        println!("Ensured user {email} (role=admin)");
        return Ok(user.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Administrator".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(Role::Admin),
        status: Set(UserStatus::Active),
        profile_img: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role=admin)");
    Ok(user.id)
}
