use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::admin::ModerateUserRequest,
    error::AppResult,
    middleware::auth::AdminUser,
    models::User,
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/ban", post(ban_user))
        .route("/users/unban", post(unban_user))
}

#[utoipa::path(
    post,
    path = "/api/users/ban",
    request_body = ModerateUserRequest,
    responses(
        (status = 200, description = "User banned", body = ApiResponse<User>),
        (status = 403, description = "Admins only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User is already banned")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn ban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<ModerateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::ban_user(&state, &admin, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/unban",
    request_body = ModerateUserRequest,
    responses(
        (status = 200, description = "User unbanned", body = ApiResponse<User>),
        (status = 403, description = "Admins only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User is not banned")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn unban_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<ModerateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::unban_user(&state, &admin, payload).await?;
    Ok(Json(resp))
}
