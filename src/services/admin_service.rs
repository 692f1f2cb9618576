use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, EntityTrait, QuerySelect, TransactionTrait,
    sea_query::LockType,
};

use crate::{
    audit,
    dto::admin::ModerateUserRequest,
    entity::{
        sea_orm_active_enums::UserStatus,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn set_status(
    state: &AppState,
    admin: &AuthUser,
    payload: ModerateUserRequest,
    target: UserStatus,
) -> AppResult<User> {
    ensure_admin(admin)?;

    let txn = state.orm.begin().await?;
    let user = Users::find_by_id(payload.user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    if user.status == target {
        let message = match target {
            UserStatus::Banned => "User is already banned.",
            UserStatus::Active => "User is not banned.",
        };
        return Err(AppError::Conflict(message.into()));
    }

    let mut active: UserActive = user.into();
    active.status = Set(target);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let action = match target {
        UserStatus::Banned => "user_ban",
        UserStatus::Active => "user_unban",
    };
    audit::record(
        &state.orm,
        Some(admin.user_id),
        action,
        "users",
        serde_json::json!({ "user_id": updated.id }),
    )
    .await;

    Ok(User::from(updated))
}

pub async fn ban_user(
    state: &AppState,
    admin: &AuthUser,
    payload: ModerateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let user = set_status(state, admin, payload, UserStatus::Banned).await?;
    Ok(ApiResponse::success(
        "User banned successfully.",
        user,
        Some(Meta::empty()),
    ))
}

pub async fn unban_user(
    state: &AppState,
    admin: &AuthUser,
    payload: ModerateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let user = set_status(state, admin, payload, UserStatus::Active).await?;
    Ok(ApiResponse::success(
        "User unbanned successfully.",
        user,
        Some(Meta::empty()),
    ))
}
