use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::activity::{
        ActivityPayload, BusinessTargetRequest, RateRequest, RatedStatus, RatingInput,
        ReviewRequest, SavedPayload,
    },
    entity::{
        BusinessProfiles, Categories, business_profiles,
        saved_destinations::{
            ActiveModel as SavedActive, Column as SavedCol, Entity as SavedDestinations,
        },
        sea_orm_active_enums::ActivityType,
        user_activities::{
            ActiveModel as ActivityActive, Column as ActivityCol, Entity as UserActivities,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{SavedDestination, UserActivity},
    response::{ApiResponse, Meta},
    state::AppState,
};

const ALREADY_SAVED: &str = "Destination already saved.";

/// Accepts 0 to 5 in half steps, from a number or a numeric string, and returns
/// the stored form with one decimal (`"4.0"`, `"3.5"`).
pub fn parse_rating(input: &RatingInput) -> Result<String, AppError> {
    let value = match input {
        RatingInput::Number(n) => *n,
        RatingInput::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_rating())?,
    };

    if !value.is_finite() || !(0.0..=5.0).contains(&value) || (value * 2.0).fract() != 0.0 {
        return Err(invalid_rating());
    }
    Ok(format!("{value:.1}"))
}

fn invalid_rating() -> AppError {
    AppError::Validation("The rating must be between 0 and 5 in steps of 0.5.".into())
}

/// Mean of the numeric values; unparsable entries are skipped and no ratings give 0.
pub fn average_rating<'a>(values: impl IntoIterator<Item = &'a str>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / f64::from(count) }
}

/// The business profile a write targets, plus its current category name.
pub async fn target_profile<C: ConnectionTrait>(
    conn: &C,
    business_user_id: Uuid,
) -> AppResult<(business_profiles::Model, Option<String>)> {
    let profile = BusinessProfiles::find_by_id(business_user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Business profile not found.".into()))?;
    let category = Categories::find_by_id(profile.category_id)
        .one(conn)
        .await?
        .map(|c| c.name);
    Ok((profile, category))
}

fn new_activity(
    user_id: Uuid,
    business_user_id: Uuid,
    activity_type: ActivityType,
    value: Option<String>,
    category: Option<String>,
) -> ActivityActive {
    let now = Utc::now();
    ActivityActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        business_user_id: Set(business_user_id),
        activity_type: Set(activity_type),
        activity_value: Set(value),
        category: Set(category),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

pub async fn save(
    state: &AppState,
    user: &AuthUser,
    payload: BusinessTargetRequest,
) -> AppResult<ApiResponse<SavedPayload>> {
    let txn = state.orm.begin().await?;

    let existing = SavedDestinations::find()
        .filter(SavedCol::UserId.eq(user.user_id))
        .filter(SavedCol::BusinessUserId.eq(payload.business_user_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(ALREADY_SAVED.into()));
    }

    let (profile, category) = target_profile(&txn, payload.business_user_id).await?;

    let saved = SavedActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        business_user_id: Set(profile.user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, ALREADY_SAVED))?;

    new_activity(user.user_id, profile.user_id, ActivityType::Save, None, category)
        .insert(&txn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, ALREADY_SAVED))?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Destination saved successfully",
        SavedPayload {
            saved_destination: SavedDestination::from(saved),
        },
        Some(Meta::empty()),
    ))
}

pub async fn unsave(
    state: &AppState,
    user: &AuthUser,
    payload: BusinessTargetRequest,
) -> AppResult<ApiResponse<()>> {
    let txn = state.orm.begin().await?;

    let deleted = SavedDestinations::delete_many()
        .filter(SavedCol::UserId.eq(user.user_id))
        .filter(SavedCol::BusinessUserId.eq(payload.business_user_id))
        .exec(&txn)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(AppError::NotFound("Saved destination not found.".into()));
    }

    UserActivities::delete_many()
        .filter(ActivityCol::UserId.eq(user.user_id))
        .filter(ActivityCol::BusinessUserId.eq(payload.business_user_id))
        .filter(ActivityCol::ActivityType.eq(ActivityType::Save))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Destination unsaved successfully",
        (),
        Some(Meta::empty()),
    ))
}

/// Records the caller's rating, replacing any earlier one for the same business.
pub async fn rate(
    state: &AppState,
    user: &AuthUser,
    payload: RateRequest,
) -> AppResult<ApiResponse<ActivityPayload>> {
    let value = parse_rating(&payload.rating)?;

    let txn = state.orm.begin().await?;
    let (profile, category) = target_profile(&txn, payload.business_user_id).await?;

    let existing = UserActivities::find()
        .filter(ActivityCol::UserId.eq(user.user_id))
        .filter(ActivityCol::BusinessUserId.eq(profile.user_id))
        .filter(ActivityCol::ActivityType.eq(ActivityType::Rate))
        .lock(LockType::Update)
        .one(&txn)
        .await?;

    let activity = match existing {
        Some(row) => {
            let mut active: ActivityActive = row.into();
            active.activity_value = Set(Some(value));
            active.category = Set(category);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        None => new_activity(
            user.user_id,
            profile.user_id,
            ActivityType::Rate,
            Some(value),
            category,
        )
        .insert(&txn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Rating was updated concurrently, try again."))?,
    };

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Destination rated successfully",
        ActivityPayload {
            user_activity: UserActivity::from(activity),
        },
        Some(Meta::empty()),
    ))
}

pub async fn review(
    state: &AppState,
    user: &AuthUser,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<ActivityPayload>> {
    payload.validate()?;
    let (profile, category) = target_profile(&state.orm, payload.business_user_id).await?;

    let activity = new_activity(
        user.user_id,
        profile.user_id,
        ActivityType::Review,
        Some(payload.review.trim().to_string()),
        category,
    )
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Destination reviewed successfully",
        ActivityPayload {
            user_activity: UserActivity::from(activity),
        },
        Some(Meta::empty()),
    ))
}

pub async fn check_rated(
    state: &AppState,
    user: &AuthUser,
    business_user_id: Uuid,
) -> AppResult<ApiResponse<RatedStatus>> {
    let existing = UserActivities::find()
        .filter(ActivityCol::UserId.eq(user.user_id))
        .filter(ActivityCol::BusinessUserId.eq(business_user_id))
        .filter(ActivityCol::ActivityType.eq(ActivityType::Rate))
        .one(&state.orm)
        .await?;

    let status = RatedStatus {
        rated: existing.is_some(),
        rating: existing.and_then(|a| a.activity_value),
    };
    Ok(ApiResponse::success(
        "Rating status retrieved successfully",
        status,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RatingInput {
        RatingInput::Text(s.to_string())
    }

    #[test]
    fn accepts_every_half_step() {
        for step in 0..=10 {
            let value = f64::from(step) / 2.0;
            assert_eq!(
                parse_rating(&RatingInput::Number(value)).unwrap(),
                format!("{value:.1}")
            );
        }
    }

    #[test]
    fn normalises_to_one_decimal() {
        assert_eq!(parse_rating(&text("4")).unwrap(), "4.0");
        assert_eq!(parse_rating(&text(" 3.5 ")).unwrap(), "3.5");
        assert_eq!(parse_rating(&RatingInput::Number(5.0)).unwrap(), "5.0");
    }

    #[test]
    fn rejects_off_grid_and_out_of_range() {
        for bad in ["4.2", "5.5", "-0.5", "abc", "", "NaN", "inf"] {
            assert!(
                matches!(parse_rating(&text(bad)), Err(AppError::Validation(_))),
                "{bad} should be rejected"
            );
        }
        assert!(parse_rating(&RatingInput::Number(0.25)).is_err());
    }

    #[test]
    fn average_is_zero_without_ratings() {
        assert_eq!(average_rating(Vec::<&str>::new()), 0.0);
    }

    #[test]
    fn average_skips_garbage() {
        assert_eq!(average_rating(["4.0", "3.0", "oops"]), 3.5);
        assert_eq!(average_rating(["5.0"]), 5.0);
    }
}
