use chrono::{NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    clients::payments::PaymentIntent,
    dto::{
        auth::BusinessFields,
        profile::{UpdateProfileRequest, UpdateSubscriptionRequest},
    },
    entity::{
        BusinessProfiles, Categories, Users, business_profiles,
        sea_orm_active_enums::{Role, SubscriptionType},
        subscriptions::{self, ActiveModel as SubscriptionActive, Column as SubCol, Entity as Subscriptions},
        users::ActiveModel as UserActive,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Subscription, UserDetail},
    response::{ApiResponse, Meta},
    services::{auth_service::user_detail, booking_service::parse_hhmm},
    state::AppState,
};

/// Business fields after presence, category and opening-hour checks.
#[derive(Debug, Clone)]
pub struct BusinessDetails {
    pub business_name: String,
    pub category_id: Uuid,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hour: Option<NaiveTime>,
    pub closing_hour: Option<NaiveTime>,
    pub main_img: Option<String>,
    pub description: Option<String>,
    pub counter_booking: i32,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_hour(value: &Option<String>) -> Result<Option<NaiveTime>, AppError> {
    non_blank(value).map(|v| parse_hhmm(&v)).transpose()
}

/// Checks the shape of the business fields without touching the database.
pub fn business_details(fields: &BusinessFields) -> Result<BusinessDetails, AppError> {
    let business_name = non_blank(&fields.business_name)
        .ok_or_else(|| AppError::Validation("The business name field is required.".into()))?;
    let category_id = fields
        .category_id
        .ok_or_else(|| AppError::Validation("The category id field is required.".into()))?;

    let opening_hour = parse_hour(&fields.opening_hour)?;
    let closing_hour = parse_hour(&fields.closing_hour)?;
    if let (Some(open), Some(close)) = (opening_hour, closing_hour) {
        if open >= close {
            return Err(AppError::Validation(
                "The opening hour must be before the closing hour.".into(),
            ));
        }
    }

    Ok(BusinessDetails {
        business_name,
        category_id,
        district: non_blank(&fields.district),
        latitude: fields.latitude,
        longitude: fields.longitude,
        opening_hour,
        closing_hour,
        main_img: non_blank(&fields.main_img),
        description: non_blank(&fields.description),
        counter_booking: fields.counter_booking.unwrap_or(1),
    })
}

/// `business_details` plus a check that the category exists.
pub async fn resolve_business_details<C: ConnectionTrait>(
    conn: &C,
    fields: &BusinessFields,
) -> AppResult<BusinessDetails> {
    let details = business_details(fields)?;
    if Categories::find_by_id(details.category_id).one(conn).await?.is_none() {
        return Err(AppError::Validation(
            "The selected category id is invalid.".into(),
        ));
    }
    Ok(details)
}

pub fn profile_active(user_id: Uuid, details: BusinessDetails) -> business_profiles::ActiveModel {
    business_profiles::ActiveModel {
        user_id: Set(user_id),
        business_name: Set(details.business_name),
        category_id: Set(details.category_id),
        district: Set(details.district),
        latitude: Set(details.latitude),
        longitude: Set(details.longitude),
        opening_hour: Set(details.opening_hour),
        closing_hour: Set(details.closing_hour),
        main_img: Set(details.main_img),
        description: Set(details.description),
        counter_booking: Set(details.counter_booking),
    }
}

pub fn subscription_active(
    business_user_id: Uuid,
    plan: SubscriptionType,
    payment: &PaymentIntent,
) -> SubscriptionActive {
    let start = Utc::now();
    SubscriptionActive {
        id: Set(Uuid::new_v4()),
        business_user_id: Set(business_user_id),
        subscription_type: Set(plan),
        start_date: Set(start.into()),
        end_date: Set(plan.period_end(start).into()),
        active: Set(true),
        price: Set(plan.price_cents()),
        payment_status: Set("paid".to_string()),
        payment_reference: Set(Some(payment.id.clone())),
        created_at: Set(start.into()),
    }
}

/// Charges the plan price, relaying the processor's message when it declines.
pub async fn charge_plan(
    state: &AppState,
    plan: SubscriptionType,
    payment_method: &str,
) -> AppResult<PaymentIntent> {
    state
        .payments
        .charge(plan.price_cents(), &state.config.payment_currency, payment_method)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, plan = ?plan, "subscription payment failed");
            AppError::Upstream(err.to_string())
        })
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserDetail>> {
    payload.validate()?;

    let business = if user.role == Role::Business {
        Some(resolve_business_details(&state.orm, &payload.business).await?)
    } else {
        None
    };

    let txn = state.orm.begin().await?;
    let existing = Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    let profile_img = non_blank(&payload.profile_img).or(existing.profile_img.clone());
    let mut active: UserActive = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.profile_img = Set(profile_img);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    if let Some(details) = business {
        if BusinessProfiles::find_by_id(user.user_id).one(&txn).await?.is_some() {
            profile_active(user.user_id, details).update(&txn).await?;
        } else {
            profile_active(user.user_id, details).insert(&txn).await?;
        }
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    let detail = user_detail(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "Profile updated successfully",
        detail,
        Some(Meta::empty()),
    ))
}

/// Charges the new plan, then swaps the active subscription in one transaction.
pub async fn update_subscription(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSubscriptionRequest,
) -> AppResult<ApiResponse<Subscription>> {
    payload.validate()?;

    let payment = charge_plan(state, payload.subscription_type, &payload.payment_method).await?;

    let txn = state.orm.begin().await?;
    Subscriptions::update_many()
        .col_expr(SubCol::Active, Expr::value(false))
        .filter(SubCol::BusinessUserId.eq(user.user_id))
        .filter(SubCol::Active.eq(true))
        .exec(&txn)
        .await?;
    let created: subscriptions::Model =
        subscription_active(user.user_id, payload.subscription_type, &payment)
            .insert(&txn)
            .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "subscription_update",
        "subscriptions",
        serde_json::json!({
            "subscription_id": created.id,
            "type": payload.subscription_type,
            "payment_reference": payment.id,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Subscription updated successfully",
        Subscription::from(created),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> BusinessFields {
        BusinessFields {
            business_name: Some("Harbour View".into()),
            category_id: Some(Uuid::new_v4()),
            opening_hour: Some("09:00".into()),
            closing_hour: Some("17:00".into()),
            ..Default::default()
        }
    }

    #[test]
    fn capacity_defaults_to_one() {
        let details = business_details(&fields()).unwrap();
        assert_eq!(details.counter_booking, 1);
        assert_eq!(details.opening_hour, NaiveTime::from_hms_opt(9, 0, 0));
    }

    #[test]
    fn business_name_and_category_are_required() {
        let missing_name = BusinessFields {
            business_name: Some("  ".into()),
            ..fields()
        };
        assert!(matches!(
            business_details(&missing_name),
            Err(AppError::Validation(_))
        ));

        let missing_category = BusinessFields {
            category_id: None,
            ..fields()
        };
        assert!(business_details(&missing_category).is_err());
    }

    #[test]
    fn hours_must_move_forward() {
        let backwards = BusinessFields {
            opening_hour: Some("18:00".into()),
            ..fields()
        };
        assert!(business_details(&backwards).is_err());

        let bad_format = BusinessFields {
            closing_hour: Some("5pm".into()),
            ..fields()
        };
        assert!(business_details(&bad_format).is_err());
    }
}
