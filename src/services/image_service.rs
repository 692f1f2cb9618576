use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::images::{DeleteImagesRequest, ImageList, UploadedFile},
    entity::{
        images::{ActiveModel as ImageActive, Column as ImageCol, Entity as Images},
        sea_orm_active_enums::ImageStatus,
    },
    error::{AppError, AppResult},
    jobs::ImageJob,
    middleware::auth::{AuthUser, ensure_self_or_admin},
    models::Image,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Lowercase ASCII slug of a file stem; `image` when nothing usable is left.
pub fn slugify(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug.to_string()
    }
}

fn extension_for(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext;
    }
    match content_type.strip_prefix("image/") {
        Some("jpeg") => "jpg".to_string(),
        Some(sub) if !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()) => {
            sub.to_string()
        }
        _ => "bin".to_string(),
    }
}

/// Object key for an upload: `users/{user_id}/{timestamp}-{image_id}-{slug}.{ext}`.
pub fn object_key(
    user_id: Uuid,
    image_id: Uuid,
    at: DateTime<Utc>,
    file_name: &str,
    content_type: &str,
) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    format!(
        "users/{user_id}/{}-{image_id}-{}.{}",
        at.timestamp_millis(),
        slugify(stem),
        extension_for(file_name, content_type)
    )
}

pub fn check_upload(file: &UploadedFile, max_bytes: usize) -> Result<(), AppError> {
    if !file.content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "{} is not an image.",
            file.file_name
        )));
    }
    if file.bytes.is_empty() {
        return Err(AppError::Validation(format!("{} is empty.", file.file_name)));
    }
    if file.bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "{} exceeds the maximum size of {} KB.",
            file.file_name,
            max_bytes / 1024
        )));
    }
    Ok(())
}

/// Stages each file locally, records it as `pending_upload` and queues its promotion.
pub async fn upload(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    files: Vec<UploadedFile>,
) -> AppResult<ApiResponse<ImageList>> {
    ensure_self_or_admin(user, owner_id)?;
    if files.is_empty() {
        return Err(AppError::Validation("The images field is required.".into()));
    }
    for file in &files {
        check_upload(file, state.config.max_upload_bytes)?;
    }

    let mut images = Vec::with_capacity(files.len());
    for file in files {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let key = object_key(owner_id, id, now, &file.file_name, &file.content_type);
        let temp_path = state.config.upload_tmp_dir.join(id.to_string());

        tokio::fs::write(&temp_path, &file.bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("staging upload")))?;

        let row = ImageActive {
            id: Set(id),
            user_id: Set(owner_id),
            path_name: Set(key.clone()),
            status: Set(ImageStatus::PendingUpload),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&state.orm)
        .await?;

        state.jobs.dispatch(ImageJob::Promote {
            image_id: id,
            temp_path,
            key: key.clone(),
            content_type: file.content_type,
        })?;
        tracing::info!(image_id = %id, key = %key, "image upload queued");

        let url = state.storage.url(&row.path_name);
        images.push(Image::from_entity(row, url));
    }

    Ok(ApiResponse::success(
        "Images are being uploaded",
        ImageList { images },
        Some(Meta::empty()),
    ))
}

pub async fn list(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
) -> AppResult<ApiResponse<ImageList>> {
    ensure_self_or_admin(user, owner_id)?;

    let images = Images::find()
        .filter(ImageCol::UserId.eq(owner_id))
        .filter(ImageCol::Status.ne(ImageStatus::PendingDelete))
        .order_by_desc(ImageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| {
            let url = state.storage.url(&row.path_name);
            Image::from_entity(row, url)
        })
        .collect();

    Ok(ApiResponse::success(
        "Images retrieved successfully",
        ImageList { images },
        Some(Meta::empty()),
    ))
}

/// Marks the images `pending_delete` and queues removal. Every id must belong to the owner.
pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payload: DeleteImagesRequest,
) -> AppResult<ApiResponse<()>> {
    ensure_self_or_admin(user, owner_id)?;
    payload.validate()?;

    let requested: HashSet<Uuid> = payload.image_ids.into_iter().collect();

    let txn = state.orm.begin().await?;
    let owned = Images::find()
        .filter(ImageCol::Id.is_in(requested.iter().copied()))
        .filter(ImageCol::UserId.eq(owner_id))
        .filter(ImageCol::Status.ne(ImageStatus::PendingDelete))
        .all(&txn)
        .await?;

    if owned.len() != requested.len() {
        return Err(AppError::Validation(
            "One or more images do not belong to this user.".into(),
        ));
    }

    let image_ids: Vec<Uuid> = owned.iter().map(|i| i.id).collect();
    let keys: Vec<String> = owned.into_iter().map(|i| i.path_name).collect();

    Images::update_many()
        .col_expr(ImageCol::Status, Expr::value(ImageStatus::PendingDelete))
        .col_expr(ImageCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(ImageCol::Id.is_in(image_ids.iter().copied()))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(%owner_id, count = image_ids.len(), "image deletion queued");
    state.jobs.dispatch(ImageJob::Delete { image_ids, keys })?;

    Ok(ApiResponse::success(
        "Images are being deleted",
        (),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(name: &str, content_type: &str, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn slugs_are_lowercase_and_dashed() {
        assert_eq!(slugify("My Holiday Photo (1)"), "my-holiday-photo-1");
        assert_eq!(slugify("__"), "image");
        assert_eq!(slugify("café"), "caf");
    }

    #[test]
    fn keys_live_under_the_owner() {
        let owner = Uuid::nil();
        let id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let key = object_key(owner, id, at, "Beach Day.JPG", "image/jpeg");
        assert_eq!(
            key,
            format!("users/{owner}/{}-{id}-beach-day.jpg", at.timestamp_millis())
        );

        let key = object_key(owner, id, at, "snapshot", "image/jpeg");
        assert!(key.ends_with("-snapshot.jpg"));
        let key = object_key(owner, id, at, "snapshot", "image/png");
        assert!(key.ends_with("-snapshot.png"));
    }

    #[test]
    fn same_name_in_the_same_millisecond_gets_distinct_keys() {
        let owner = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let first = object_key(owner, Uuid::new_v4(), at, "photo.png", "image/png");
        let second = object_key(owner, Uuid::new_v4(), at, "photo.png", "image/png");
        assert_ne!(first, second);
    }

    #[test]
    fn upload_checks_type_and_size() {
        assert!(check_upload(&file("a.png", "image/png", 10), 100).is_ok());
        assert!(check_upload(&file("a.pdf", "application/pdf", 10), 100).is_err());
        assert!(check_upload(&file("a.png", "image/png", 101), 100).is_err());
        assert!(check_upload(&file("a.png", "image/png", 0), 100).is_err());
    }
}
