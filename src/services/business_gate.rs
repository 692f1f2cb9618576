//! Access check for business-only endpoints: a business role, a profile, and a
//! subscription that is both flagged active and not past its end date.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};

use crate::{
    entity::{
        BusinessProfiles, Subscriptions, business_profiles,
        sea_orm_active_enums::Role,
        subscriptions::{self, Column as SubCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Past its end date; the stored flag must be cleared.
    Expired,
    Inactive,
}

pub fn evaluate(subscription: &subscriptions::Model, now: DateTime<Utc>) -> GateDecision {
    if subscription.end_date.with_timezone(&Utc) < now {
        GateDecision::Expired
    } else if !subscription.active {
        GateDecision::Inactive
    } else {
        GateDecision::Allow
    }
}

fn inactive() -> AppError {
    AppError::Forbidden("Inactive business subscription.".into())
}

/// The active subscription, or else the most recently created one.
pub async fn current_subscription<C: ConnectionTrait>(
    conn: &C,
    business_user_id: uuid::Uuid,
) -> AppResult<Option<subscriptions::Model>> {
    let active = Subscriptions::find()
        .filter(SubCol::BusinessUserId.eq(business_user_id))
        .filter(SubCol::Active.eq(true))
        .order_by_desc(SubCol::CreatedAt)
        .one(conn)
        .await?;
    if active.is_some() {
        return Ok(active);
    }

    // a replaced plan can end later than its successor, so recency is by creation
    let latest = Subscriptions::find()
        .filter(SubCol::BusinessUserId.eq(business_user_id))
        .order_by_desc(SubCol::CreatedAt)
        .one(conn)
        .await?;
    Ok(latest)
}

/// Runs the gate for `user`, returning the profile and the subscription that let them in.
pub async fn authorize<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    now: DateTime<Utc>,
) -> AppResult<(business_profiles::Model, subscriptions::Model)> {
    if user.role != Role::Business {
        return Err(AppError::Forbidden(
            "Access denied. Business authorization required.".into(),
        ));
    }

    let profile = BusinessProfiles::find_by_id(user.user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Business profile not found.".into()))?;

    let subscription = current_subscription(conn, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active subscription found.".into()))?;

    match evaluate(&subscription, now) {
        GateDecision::Allow => Ok((profile, subscription)),
        GateDecision::Expired => {
            if subscription.active {
                Subscriptions::update_many()
                    .col_expr(SubCol::Active, Expr::value(false))
                    .filter(SubCol::Id.eq(subscription.id))
                    .exec(conn)
                    .await?;
                tracing::info!(
                    business_user_id = %user.user_id,
                    subscription_id = %subscription.id,
                    "subscription expired, marked inactive"
                );
            }
            Err(inactive())
        }
        GateDecision::Inactive => Err(inactive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::sea_orm_active_enums::SubscriptionType;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn subscription(end: DateTime<Utc>, active: bool) -> subscriptions::Model {
        let start = end - Duration::days(30);
        subscriptions::Model {
            id: Uuid::new_v4(),
            business_user_id: Uuid::new_v4(),
            subscription_type: SubscriptionType::Monthly,
            start_date: start.fixed_offset(),
            end_date: end.fixed_offset(),
            active,
            price: 1499,
            payment_status: "succeeded".into(),
            payment_reference: None,
            created_at: start.fixed_offset(),
        }
    }

    #[test]
    fn current_active_subscription_passes() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let sub = subscription(now + Duration::days(3), true);
        assert_eq!(evaluate(&sub, now), GateDecision::Allow);
    }

    #[test]
    fn past_end_date_is_expired_even_if_flagged_active() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let sub = subscription(now - Duration::seconds(1), true);
        assert_eq!(evaluate(&sub, now), GateDecision::Expired);
    }

    #[test]
    fn end_date_equal_to_now_still_passes() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(evaluate(&subscription(now, true), now), GateDecision::Allow);
    }

    #[test]
    fn deactivated_subscription_is_rejected() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let sub = subscription(now + Duration::days(10), false);
        assert_eq!(evaluate(&sub, now), GateDecision::Inactive);
    }
}
