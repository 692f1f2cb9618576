use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::AppResult, models::Category, response::ApiResponse,
    services::destination_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories", body = ApiResponse<Vec<Category>>)
    ),
    tag = "Destinations"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    let resp = destination_service::categories(&state).await?;
    Ok(Json(resp))
}
