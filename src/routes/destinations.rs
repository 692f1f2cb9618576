use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::destinations::{BusinessBooking, GroupedDestinations, RatingSummary, ReviewEntry},
    error::AppResult,
    models::Destination,
    response::ApiResponse,
    services::{booking_service, destination_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/destinations", get(list_destinations))
        .route("/destinations/grouped", get(grouped_destinations))
        .route("/destinations/name/{name}", get(destinations_by_name))
        .route("/destinations/category/{category}", get(destinations_by_category))
        .route("/destinations/district/{district}", get(destinations_by_district))
        .route("/destinations/bookings/{business_user_id}", get(business_bookings))
        .route("/destinations/reviews/{business_user_id}", get(destination_reviews))
        .route("/destinations/rating/{business_user_id}", get(destination_rating))
        .route("/destinations/{user_id}", get(destination_by_owner))
}

#[utoipa::path(
    get,
    path = "/api/destinations",
    responses(
        (status = 200, description = "Destinations of active owners", body = ApiResponse<Vec<Destination>>)
    ),
    tag = "Destinations"
)]
pub async fn list_destinations(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Destination>>>> {
    let resp = destination_service::list_all(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/grouped",
    responses(
        (status = 200, description = "Destinations split by owner status", body = ApiResponse<GroupedDestinations>)
    ),
    tag = "Destinations"
)]
pub async fn grouped_destinations(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<GroupedDestinations>>> {
    let resp = destination_service::grouped_by_status(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/name/{name}",
    params(("name" = String, Path, description = "Part of the business name")),
    responses(
        (status = 200, description = "Matching destinations", body = ApiResponse<Vec<Destination>>)
    ),
    tag = "Destinations"
)]
pub async fn destinations_by_name(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Destination>>>> {
    let resp = destination_service::by_name(&state, &name).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/category/{category}",
    params(("category" = String, Path, description = "Category id or part of its name")),
    responses(
        (status = 200, description = "Destinations in the category", body = ApiResponse<Vec<Destination>>),
        (status = 404, description = "Category not found")
    ),
    tag = "Destinations"
)]
pub async fn destinations_by_category(
    Path(category): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Destination>>>> {
    let resp = destination_service::by_category(&state, &category).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/district/{district}",
    params(("district" = String, Path, description = "Part of the district name")),
    responses(
        (status = 200, description = "Destinations in the district", body = ApiResponse<Vec<Destination>>)
    ),
    tag = "Destinations"
)]
pub async fn destinations_by_district(
    Path(district): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Destination>>>> {
    let resp = destination_service::by_district(&state, &district).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/{user_id}",
    params(("user_id" = Uuid, Path, description = "Business owner id")),
    responses(
        (status = 200, description = "Destination", body = ApiResponse<Destination>),
        (status = 404, description = "Destination not found")
    ),
    tag = "Destinations"
)]
pub async fn destination_by_owner(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Destination>>> {
    let resp = destination_service::by_owner(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/bookings/{business_user_id}",
    params(("business_user_id" = Uuid, Path, description = "Business owner id")),
    responses(
        (status = 200, description = "Bookings received by the business", body = ApiResponse<Vec<BusinessBooking>>)
    ),
    tag = "Destinations"
)]
pub async fn business_bookings(
    Path(business_user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<BusinessBooking>>>> {
    let resp = booking_service::business_bookings(&state, business_user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/reviews/{business_user_id}",
    params(("business_user_id" = Uuid, Path, description = "Business owner id")),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<Vec<ReviewEntry>>)
    ),
    tag = "Destinations"
)]
pub async fn destination_reviews(
    Path(business_user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ReviewEntry>>>> {
    let resp = destination_service::reviews(&state, business_user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/rating/{business_user_id}",
    params(("business_user_id" = Uuid, Path, description = "Business owner id")),
    responses(
        (status = 200, description = "Average rating and count", body = ApiResponse<RatingSummary>)
    ),
    tag = "Destinations"
)]
pub async fn destination_rating(
    Path(business_user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RatingSummary>>> {
    let resp = destination_service::rating(&state, business_user_id).await?;
    Ok(Json(resp))
}
