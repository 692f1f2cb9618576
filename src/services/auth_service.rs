use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{AuthPayload, Claims, LoginRequest, RegisterRequest, TokenResponse},
    entity::{
        BusinessProfiles, Categories, Users,
        revoked_tokens::ActiveModel as RevokedActive,
        sea_orm_active_enums::{Role, SubscriptionType, UserStatus},
        users::{self, ActiveModel as UserActive, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BusinessProfile, Subscription, User, UserDetail},
    response::{ApiResponse, Meta},
    services::{business_gate, profile_service},
    state::AppState,
};

const EMAIL_TAKEN: &str = "The email has already been taken.";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Signs a fresh token for `user` with a new `jti`.
pub fn issue_token(config: &AppConfig, user_id: Uuid, role: Role) -> AppResult<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// The user view returned by auth endpoints. Business accounts carry their profile
/// and current subscription.
pub async fn user_detail<C: ConnectionTrait>(conn: &C, user: users::Model) -> AppResult<UserDetail> {
    if user.role != Role::Business {
        return Ok(UserDetail {
            user: User::from(user),
            business_profile: None,
            subscription: None,
        });
    }

    let business_profile = match BusinessProfiles::find_by_id(user.id).one(conn).await? {
        Some(profile) => {
            let category = Categories::find_by_id(profile.category_id)
                .one(conn)
                .await?
                .map(|c| c.name);
            Some(BusinessProfile::from_entity(profile, category))
        }
        None => None,
    };
    let subscription = business_gate::current_subscription(conn, user.id)
        .await?
        .map(Subscription::from);

    Ok(UserDetail {
        user: User::from(user),
        business_profile,
        subscription,
    })
}

async fn ensure_email_free<C: ConnectionTrait>(conn: &C, email: &str) -> AppResult<()> {
    let taken = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(conn)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }
    Ok(())
}

fn new_user(payload: &RegisterRequest, email: &str, password_hash: String) -> UserActive {
    let now = Utc::now();
    UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(payload.role),
        status: Set(UserStatus::Active),
        profile_img: Set(payload
            .profile_img
            .clone()
            .filter(|p| !p.trim().is_empty())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

/// Creates an account. Business accounts are charged for their plan first, then the
/// user, profile and subscription rows are written together.
pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    payload.validate()?;
    if payload.role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be registered.".into(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    ensure_email_free(&state.orm, &email).await?;

    let business = if payload.role == Role::Business {
        let details = profile_service::resolve_business_details(&state.orm, &payload.business).await?;
        let plan: SubscriptionType = payload.subscription_type.ok_or_else(|| {
            AppError::Validation("The subscription type field is required.".into())
        })?;
        let payment_method = payload
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::Validation("The payment method field is required.".into()))?;
        Some((details, plan, payment_method.to_string()))
    } else {
        None
    };

    let password_hash = hash_password(&payload.password)?;

    let payment = match &business {
        Some((_, plan, payment_method)) => {
            Some(profile_service::charge_plan(state, *plan, payment_method).await?)
        }
        None => None,
    };

    let txn = state.orm.begin().await?;
    let user = new_user(&payload, &email, password_hash)
        .insert(&txn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, EMAIL_TAKEN))?;

    if let (Some((details, plan, _)), Some(payment)) = (business, payment.as_ref()) {
        profile_service::profile_active(user.id, details)
            .insert(&txn)
            .await?;
        profile_service::subscription_active(user.id, plan, payment)
            .insert(&txn)
            .await?;
    }
    txn.commit().await?;

    if let Some(payment) = &payment {
        tracing::info!(user_id = %user.id, payment_reference = %payment.id, "business registered");
    }
    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    let token = issue_token(&state.config, user.id, user.role)?;
    let detail = user_detail(&state.orm, user).await?;
    Ok(ApiResponse::success(
        "User registered successfully",
        AuthPayload {
            user: detail,
            token,
        },
        Some(Meta::empty()),
    ))
}

async fn authenticate(state: &AppState, payload: &LoginRequest) -> AppResult<users::Model> {
    payload.validate()?;
    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }
    if user.status == UserStatus::Banned {
        return Err(AppError::Forbidden("Your account has been banned.".into()));
    }
    Ok(user)
}

async fn complete_login(
    state: &AppState,
    user: users::Model,
    action: &str,
) -> AppResult<ApiResponse<AuthPayload>> {
    let token = issue_token(&state.config, user.id, user.role)?;
    audit::record(
        &state.orm,
        Some(user.id),
        action,
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let detail = user_detail(&state.orm, user).await?;
    Ok(ApiResponse::success(
        "Login successful",
        AuthPayload {
            user: detail,
            token,
        },
        Some(Meta::empty()),
    ))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<AuthPayload>> {
    let user = authenticate(state, &payload).await?;

    if user.role == Role::Business {
        let caller = AuthUser {
            user_id: user.id,
            role: user.role,
            jti: Uuid::nil(),
            expires_at: Utc::now(),
        };
        business_gate::authorize(&state.orm, &caller, Utc::now()).await?;
    }

    complete_login(state, user, "user_login").await
}

pub async fn admin_login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    let user = authenticate(state, &payload).await?;
    if user.role != Role::Admin {
        return Err(AppError::Forbidden("Access denied. Admins only.".into()));
    }
    complete_login(state, user, "admin_login").await
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserDetail>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let detail = user_detail(&state.orm, model).await?;
    Ok(ApiResponse::success(
        "Authenticated user retrieved successfully",
        detail,
        Some(Meta::empty()),
    ))
}

async fn revoke<C: ConnectionTrait>(conn: &C, user: &AuthUser) -> AppResult<()> {
    let expires_at: DateTime<Utc> = user.expires_at;
    RevokedActive {
        jti: Set(user.jti),
        user_id: Set(user.user_id),
        expires_at: Set(expires_at.into()),
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Token has already been revoked."))?;
    Ok(())
}

pub async fn logout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<()>> {
    revoke(&state.orm, user).await?;
    Ok(ApiResponse::success(
        "Successfully logged out",
        (),
        Some(Meta::empty()),
    ))
}

/// Revokes the presented token and issues a replacement.
pub async fn refresh(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<TokenResponse>> {
    let token = issue_token(&state.config, user.user_id, user.role)?;
    revoke(&state.orm, user).await?;
    Ok(ApiResponse::success(
        "Token refreshed successfully",
        TokenResponse { token },
        Some(Meta::empty()),
    ))
}
