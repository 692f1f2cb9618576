use axum::{Json, Router, extract::State, routing::put};

use crate::{
    dto::profile::{UpdateProfileRequest, UpdateSubscriptionRequest},
    error::AppResult,
    middleware::auth::{AuthUser, BusinessUser},
    models::{Subscription, UserDetail},
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/edit", put(update_profile))
        .route("/business/profile/edit", put(update_business_profile))
        .route("/business/subscription/edit", put(update_subscription))
}

#[utoipa::path(
    put,
    path = "/api/profile/edit",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserDetail>),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/business/profile/edit",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Business profile updated", body = ApiResponse<UserDetail>),
        (status = 403, description = "Not a business with an active subscription")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_business_profile(
    State(state): State<AppState>,
    BusinessUser(user): BusinessUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/business/subscription/edit",
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription replaced", body = ApiResponse<Subscription>),
        (status = 403, description = "Not a business with an active subscription"),
        (status = 500, description = "Payment failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    BusinessUser(user): BusinessUser,
    Json(payload): Json<UpdateSubscriptionRequest>,
) -> AppResult<Json<ApiResponse<Subscription>>> {
    let resp = profile_service::update_subscription(&state, &user, payload).await?;
    Ok(Json(resp))
}
