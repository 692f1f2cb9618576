use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::activity::{
        ActivityPayload, BookRequest, BookingOutcome, BusinessTargetRequest, RateRequest,
        ReviewRequest, SavedPayload,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{activity_service, booking_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activity/save", post(save_destination))
        .route("/activity/unsave", post(unsave_destination))
        .route("/activity/rate", post(rate_destination))
        .route("/activity/review", post(review_destination))
        .route("/activity/book", post(book_slot))
}

#[utoipa::path(
    post,
    path = "/api/activity/save",
    request_body = BusinessTargetRequest,
    responses(
        (status = 200, description = "Destination saved", body = ApiResponse<SavedPayload>),
        (status = 404, description = "Business profile not found"),
        (status = 409, description = "Already saved")
    ),
    security(("bearer_auth" = [])),
    tag = "Activity"
)]
pub async fn save_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BusinessTargetRequest>,
) -> AppResult<Json<ApiResponse<SavedPayload>>> {
    let resp = activity_service::save(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/unsave",
    request_body = BusinessTargetRequest,
    responses(
        (status = 200, description = "Destination unsaved"),
        (status = 404, description = "Saved destination not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Activity"
)]
pub async fn unsave_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BusinessTargetRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = activity_service::unsave(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/rate",
    request_body = RateRequest,
    responses(
        (status = 200, description = "Destination rated", body = ApiResponse<ActivityPayload>),
        (status = 404, description = "Business profile not found"),
        (status = 422, description = "Rating not in 0..5 half steps")
    ),
    security(("bearer_auth" = [])),
    tag = "Activity"
)]
pub async fn rate_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RateRequest>,
) -> AppResult<Json<ApiResponse<ActivityPayload>>> {
    let resp = activity_service::rate(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/review",
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Destination reviewed", body = ApiResponse<ActivityPayload>),
        (status = 404, description = "Business profile not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Activity"
)]
pub async fn review_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<Json<ApiResponse<ActivityPayload>>> {
    let resp = activity_service::review(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/activity/book",
    request_body = BookRequest,
    responses(
        (status = 200, description = "Slot booked", body = ApiResponse<BookingOutcome>),
        (status = 404, description = "Business profile not found"),
        (status = 409, description = "Slot is full"),
        (status = 422, description = "Outside business hours or malformed date/time")
    ),
    security(("bearer_auth" = [])),
    tag = "Activity"
)]
pub async fn book_slot(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BookRequest>,
) -> AppResult<Json<ApiResponse<BookingOutcome>>> {
    let resp = booking_service::attempt_booking(&state, &user, payload).await?;
    Ok(Json(resp))
}
