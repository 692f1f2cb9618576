#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set, Statement};
use tourism_api::{
    clients::{
        ai::{CompletionRequest, TextCompletion},
        payments::{PaymentGateway, PaymentIntent},
        storage::ObjectStorage,
    },
    config::{AppConfig, StorageBackend},
    db::{create_orm_conn, run_migrations},
    entity::{
        business_profiles::ActiveModel as ProfileActive,
        categories::ActiveModel as CategoryActive,
        sea_orm_active_enums::{Role, SubscriptionType, UserStatus},
        subscriptions::ActiveModel as SubscriptionActive,
        users::ActiveModel as UserActive,
    },
    jobs::RetryPolicy,
    middleware::auth::AuthUser,
    state::AppState,
};
use uuid::Uuid;

/// `None` when no database is configured, so callers can skip.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

pub struct CannedCompletion(pub Option<String>);

#[async_trait]
impl TextCompletion for CannedCompletion {
    async fn complete(&self, _request: CompletionRequest) -> anyhow::Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Approves every charge except the `pm_card_declined` method.
pub struct StubPayments;

#[async_trait]
impl PaymentGateway for StubPayments {
    async fn charge(
        &self,
        _amount_cents: i64,
        _currency: &str,
        payment_method: &str,
    ) -> anyhow::Result<PaymentIntent> {
        if payment_method == "pm_card_declined" {
            anyhow::bail!("Your card was declined.");
        }
        Ok(PaymentIntent {
            id: format!("pi_{}", Uuid::new_v4().simple()),
            status: "succeeded".into(),
        })
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.objects.lock().unwrap().remove(key).is_some())
    }

    fn url(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    let tmp: PathBuf = std::env::temp_dir().join(format!("tourism-api-test-{}", Uuid::new_v4()));
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-secret".into(),
        jwt_ttl_hours: 1,
        openai_api_key: None,
        openai_base_url: String::new(),
        openai_model: String::new(),
        stripe_secret_key: None,
        payment_currency: "usd".into(),
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_public_url: None,
        local_storage_dir: tmp.join("objects"),
        upload_tmp_dir: tmp.join("uploads"),
        max_upload_bytes: 1024 * 1024,
    }
}

pub async fn reset(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE images, saved_destinations, user_activities, bookings, subscriptions, \
         business_profiles, revoked_tokens, audit_logs, users, categories RESTART IDENTITY CASCADE"
            .to_string(),
    ))
    .await?;
    Ok(())
}

pub async fn setup_state(
    database_url: &str,
    completion: Option<&str>,
    storage: Arc<MemoryStorage>,
) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    reset(&orm).await?;

    let config = test_config(database_url);
    tokio::fs::create_dir_all(&config.upload_tmp_dir).await?;

    Ok(AppState::with_collaborators(
        config,
        orm,
        Arc::new(CannedCompletion(completion.map(str::to_string))),
        Arc::new(StubPayments),
        storage,
        RetryPolicy::immediate(3),
    ))
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".into()),
        role: Set(role),
        status: Set(UserStatus::Active),
        profile_img: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
        jti: Uuid::new_v4(),
        expires_at: now + chrono::Duration::hours(1),
    })
}

/// A profile open 09:00 to 17:00 in "Old Town", with no subscription.
pub async fn add_profile(
    state: &AppState,
    owner_id: Uuid,
    name: &str,
    category_id: Uuid,
    capacity: i32,
) -> anyhow::Result<()> {
    ProfileActive {
        user_id: Set(owner_id),
        business_name: Set(name.to_string()),
        category_id: Set(category_id),
        district: Set(Some("Old Town".into())),
        latitude: Set(None),
        longitude: Set(None),
        opening_hour: Set(NaiveTime::from_hms_opt(9, 0, 0)),
        closing_hour: Set(NaiveTime::from_hms_opt(17, 0, 0)),
        main_img: Set(None),
        description: Set(None),
        counter_booking: Set(capacity),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

/// A business account with a profile from `add_profile` and a current monthly plan.
pub async fn create_business(
    state: &AppState,
    email: &str,
    name: &str,
    category_id: Uuid,
    capacity: i32,
) -> anyhow::Result<AuthUser> {
    let owner = create_user(state, Role::Business, email).await?;
    add_profile(state, owner.user_id, name, category_id, capacity).await?;

    let start = Utc::now() - chrono::Duration::days(1);
    SubscriptionActive {
        id: Set(Uuid::new_v4()),
        business_user_id: Set(owner.user_id),
        subscription_type: Set(SubscriptionType::Monthly),
        start_date: Set(start.into()),
        end_date: Set(SubscriptionType::Monthly.period_end(start).into()),
        active: Set(true),
        price: Set(SubscriptionType::Monthly.price_cents()),
        payment_status: Set("paid".into()),
        payment_reference: Set(None),
        created_at: Set(start.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(owner)
}
