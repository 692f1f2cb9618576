use rand::seq::SliceRandom;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    clients::ai::ActivitySignal,
    entity::user_activities::{Column as ActivityCol, Entity as UserActivities},
    error::{AppError, AppResult},
    models::Destination,
    response::{ApiResponse, Meta},
    services::destination_service,
    state::AppState,
};

/// Destinations from the categories the user engaged with most, in random order.
pub async fn recommend_for(state: &AppState, user_id: Uuid) -> AppResult<Vec<Destination>> {
    let signals: Vec<ActivitySignal> = UserActivities::find()
        .filter(ActivityCol::UserId.eq(user_id))
        .order_by_desc(ActivityCol::UpdatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|a| ActivitySignal {
            activity_type: a.activity_type.as_str().to_string(),
            value: a.activity_value,
            category: a.category,
        })
        .collect();

    if signals.is_empty() {
        return Err(AppError::NotFound(
            "No activities found for this user.".into(),
        ));
    }

    let categories = state
        .assistant
        .recommend_categories(&signals)
        .await
        .map_err(|err| {
            tracing::error!(%user_id, error = ?err, "category recommendation failed");
            AppError::Upstream("Unable to generate recommendations right now.".into())
        })?;
    tracing::debug!(%user_id, ?categories, "recommended categories");

    let mut destinations = destination_service::in_categories(&state.orm, &categories).await?;
    destinations.shuffle(&mut rand::thread_rng());
    Ok(destinations)
}

pub async fn recommend(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<Vec<Destination>>> {
    let destinations = recommend_for(state, user_id).await?;
    Ok(ApiResponse::success(
        "Recommended destinations retrieved successfully.",
        destinations,
        Some(Meta::empty()),
    ))
}
