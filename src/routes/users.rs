use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{activity::RatedStatus, destinations::UserBooking},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Destination,
    response::ApiResponse,
    services::{activity_service, booking_service, destination_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/{user_id}/bookings", get(user_bookings))
        .route("/user/{user_id}/saved", get(saved_destinations))
        .route("/user/check-rated/{business_user_id}", get(check_rated))
}

#[utoipa::path(
    get,
    path = "/api/user/{user_id}/bookings",
    params(("user_id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Bookings made by the user", body = ApiResponse<Vec<UserBooking>>)
    ),
    tag = "Users"
)]
pub async fn user_bookings(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserBooking>>>> {
    let resp = booking_service::user_bookings(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/{user_id}/saved",
    params(("user_id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Destinations saved by the user", body = ApiResponse<Vec<Destination>>)
    ),
    tag = "Users"
)]
pub async fn saved_destinations(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Destination>>>> {
    let resp = destination_service::saved_by_user(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/check-rated/{business_user_id}",
    params(("business_user_id" = Uuid, Path, description = "Business owner id")),
    responses(
        (status = 200, description = "Whether the caller rated the business", body = ApiResponse<RatedStatus>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn check_rated(
    Path(business_user_id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RatedStatus>>> {
    let resp = activity_service::check_rated(&state, &user, business_user_id).await?;
    Ok(Json(resp))
}
