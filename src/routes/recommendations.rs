use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::chat::{ChatRequest, ChatResponse},
    error::AppResult,
    models::Destination,
    response::ApiResponse,
    services::{chatbot_service, recommendation_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommend-destinations/{user_id}", get(recommend_destinations))
        .route("/{user_id}/chatbot", post(chatbot))
}

#[utoipa::path(
    get,
    path = "/api/recommend-destinations/{user_id}",
    params(("user_id" = Uuid, Path, description = "User to recommend for")),
    responses(
        (status = 200, description = "Destinations in the user's favourite categories", body = ApiResponse<Vec<Destination>>),
        (status = 404, description = "No activities found for this user"),
        (status = 500, description = "Recommendation provider failed")
    ),
    tag = "Recommendations"
)]
pub async fn recommend_destinations(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Destination>>>> {
    let resp = recommendation_service::recommend(&state, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/{user_id}/chatbot",
    params(("user_id" = Uuid, Path, description = "User chatting")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply and any matched destinations", body = ApiResponse<ChatResponse>),
        (status = 404, description = "User not found")
    ),
    tag = "Recommendations"
)]
pub async fn chatbot(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatResponse>>> {
    let resp = chatbot_service::chat(&state, user_id, payload).await?;
    Ok(Json(resp))
}
