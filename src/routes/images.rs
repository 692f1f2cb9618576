use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::get,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::images::{DeleteImagesRequest, ImageList, UploadedFile},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::image_service,
    state::AppState,
};

/// Multipart body for uploads; repeat the `images` part once per file.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    images: Vec<Vec<u8>>,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/images",
        get(list_images).post(upload_images).delete(delete_images),
    )
}

async fn read_files(mut multipart: Multipart) -> AppResult<Vec<UploadedFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        files.push(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/images",
    params(("user_id" = Uuid, Path, description = "Image owner")),
    responses(
        (status = 200, description = "Images not pending deletion", body = ApiResponse<ImageList>),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Images"
)]
pub async fn list_images(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ImageList>>> {
    let resp = image_service::list(&state, &user, user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/images",
    params(("user_id" = Uuid, Path, description = "Image owner")),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Uploads queued", body = ApiResponse<ImageList>),
        (status = 422, description = "Not an image or too large")
    ),
    security(("bearer_auth" = [])),
    tag = "Images"
)]
pub async fn upload_images(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<ImageList>>)> {
    let files = read_files(multipart).await?;
    let resp = image_service::upload(&state, &user, user_id, files).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/images",
    params(("user_id" = Uuid, Path, description = "Image owner")),
    request_body = DeleteImagesRequest,
    responses(
        (status = 202, description = "Deletion queued"),
        (status = 422, description = "An id does not belong to the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Images"
)]
pub async fn delete_images(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<DeleteImagesRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<()>>)> {
    let resp = image_service::delete(&state, &user, user_id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}
