mod common;

use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tourism_api::{
    dto::{
        admin::ModerateUserRequest,
        auth::{BusinessFields, LoginRequest, RegisterRequest},
        profile::UpdateSubscriptionRequest,
    },
    entity::{
        Users,
        sea_orm_active_enums::{Role, SubscriptionType, UserStatus},
        subscriptions::{Column as SubCol, Entity as Subscriptions},
        users::Column as UserCol,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{admin_service, auth_service, business_gate, profile_service},
};

use common::{MemoryStorage, create_category, create_user, setup_state};

fn registration(email: &str, role: Role) -> RegisterRequest {
    RegisterRequest {
        name: "Owner".into(),
        email: email.into(),
        password: "secret123".into(),
        role,
        profile_img: None,
        business: BusinessFields::default(),
        subscription_type: None,
        payment_method: None,
    }
}

// Registration, login, plan change, logout and moderation.
#[tokio::test]
async fn register_login_and_moderation_flow() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url, None, Arc::new(MemoryStorage::default())).await?;
    let restaurant = create_category(&state, "Restaurant").await?;

    let normal = auth_service::register(&state, registration("diner@example.com", Role::Normal))
        .await?
        .data
        .unwrap();
    assert!(normal.user.business_profile.is_none());

    let duplicate =
        auth_service::register(&state, registration("diner@example.com", Role::Normal)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // business registration without a plan is rejected before any charge
    let mut incomplete = registration("cafe@example.com", Role::Business);
    incomplete.business.business_name = Some("Corner Cafe".into());
    incomplete.business.category_id = Some(restaurant);
    let missing_plan = auth_service::register(&state, incomplete).await;
    assert!(matches!(missing_plan, Err(AppError::Validation(_))));

    let mut declined = registration("cafe@example.com", Role::Business);
    declined.business.business_name = Some("Corner Cafe".into());
    declined.business.category_id = Some(restaurant);
    declined.subscription_type = Some(SubscriptionType::Monthly);
    declined.payment_method = Some("pm_card_declined".into());
    let declined = auth_service::register(&state, declined).await;
    assert!(matches!(declined, Err(AppError::Upstream(ref m)) if m == "Your card was declined."));
    let cafe_rows = Users::find()
        .filter(UserCol::Email.eq("cafe@example.com"))
        .count(&state.orm)
        .await?;
    assert_eq!(cafe_rows, 0);

    let mut business = registration("cafe@example.com", Role::Business);
    business.business.business_name = Some("Corner Cafe".into());
    business.business.category_id = Some(restaurant);
    business.business.opening_hour = Some("08:00".into());
    business.business.closing_hour = Some("20:00".into());
    business.subscription_type = Some(SubscriptionType::Yearly);
    business.payment_method = Some("pm_card_visa".into());
    let registered = auth_service::register(&state, business).await?.data.unwrap();
    let profile = registered.user.business_profile.expect("business profile");
    assert_eq!(profile.counter_booking, 1);
    assert_eq!(profile.available_booking_slots.len(), 12);
    let subscription = registered.user.subscription.expect("subscription");
    assert_eq!(subscription.price, 14999);
    assert!(subscription.active);

    let login = auth_service::login(
        &state,
        LoginRequest {
            email: "cafe@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    let claims = auth_service::decode_token(&state.config.jwt_secret, &login.token)?;
    assert_eq!(claims.role, "business");

    let wrong_password = auth_service::login(
        &state,
        LoginRequest {
            email: "cafe@example.com".into(),
            password: "nope-nope".into(),
        },
    )
    .await;
    assert!(matches!(wrong_password, Err(AppError::Unauthorized)));

    // switching plans leaves exactly one active subscription
    let owner = AuthUser {
        user_id: registered.user.user.id,
        role: Role::Business,
        jti: uuid::Uuid::parse_str(&claims.jti)?,
        expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
    };
    profile_service::update_subscription(
        &state,
        &owner,
        UpdateSubscriptionRequest {
            subscription_type: SubscriptionType::Monthly,
            payment_method: "pm_card_visa".into(),
        },
    )
    .await?;
    let active = Subscriptions::find()
        .filter(SubCol::BusinessUserId.eq(owner.user_id))
        .filter(SubCol::Active.eq(true))
        .all(&state.orm)
        .await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].subscription_type, SubscriptionType::Monthly);

    // the replaced yearly row ends later than the new monthly one; the gate must still pass
    let (_, current) = business_gate::authorize(&state.orm, &owner, chrono::Utc::now()).await?;
    assert_eq!(current.id, active[0].id);
    assert_eq!(current.subscription_type, SubscriptionType::Monthly);
    let shown = auth_service::me(&state, &owner)
        .await?
        .data
        .unwrap()
        .subscription
        .expect("subscription");
    assert_eq!(shown.subscription_type, SubscriptionType::Monthly);
    assert!(shown.active);

    auth_service::logout(&state, &owner).await?;
    let twice = auth_service::logout(&state, &owner).await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));

    // moderation
    let admin = create_user(&state, Role::Admin, "root@example.com").await?;
    let target = || ModerateUserRequest {
        user_id: normal.user.user.id,
    };
    let not_admin = admin_service::ban_user(&state, &owner, target()).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden(_))));

    let banned = admin_service::ban_user(&state, &admin, target()).await?.data.unwrap();
    assert_eq!(banned.status, UserStatus::Banned);
    let again = admin_service::ban_user(&state, &admin, target()).await;
    assert!(matches!(again, Err(AppError::Conflict(ref m)) if m == "User is already banned."));

    let banned_login = auth_service::login(
        &state,
        LoginRequest {
            email: "diner@example.com".into(),
            password: "secret123".into(),
        },
    )
    .await;
    assert!(matches!(banned_login, Err(AppError::Forbidden(_))));

    admin_service::unban_user(&state, &admin, target()).await?;
    let not_banned = admin_service::unban_user(&state, &admin, target()).await;
    assert!(matches!(not_banned, Err(AppError::Conflict(ref m)) if m == "User is not banned."));

    Ok(())
}
