mod common;

use std::{sync::Arc, time::Duration};

use tourism_api::{
    dto::images::{DeleteImagesRequest, UploadedFile},
    entity::sea_orm_active_enums::{ImageStatus, Role},
    error::AppError,
    services::image_service,
    state::AppState,
};
use uuid::Uuid;

use common::{MemoryStorage, create_user, setup_state};

async fn wait_for_status(
    state: &AppState,
    owner: &tourism_api::middleware::auth::AuthUser,
    wanted: ImageStatus,
) -> anyhow::Result<()> {
    for _ in 0..50 {
        let images = image_service::list(state, owner, owner.user_id)
            .await?
            .data
            .map(|list| list.images)
            .unwrap_or_default();
        if !images.is_empty() && images.iter().all(|i| i.status == wanted) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("images never reached {wanted:?}")
}

// Upload is staged and promoted in the background; delete removes both row and object.
#[tokio::test]
async fn upload_list_and_delete_images() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let storage = Arc::new(MemoryStorage::default());
    let state = setup_state(&database_url, None, storage.clone()).await?;

    let owner = create_user(&state, Role::Normal, "painter@example.com").await?;
    let stranger = create_user(&state, Role::Normal, "stranger@example.com").await?;

    let files = vec![UploadedFile {
        file_name: "Sunset View.PNG".into(),
        content_type: "image/png".into(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    }];

    let forbidden = image_service::upload(&state, &stranger, owner.user_id, files.clone()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let queued = image_service::upload(&state, &owner, owner.user_id, files)
        .await?
        .data
        .unwrap();
    assert_eq!(queued.images.len(), 1);
    let image = &queued.images[0];
    assert_eq!(image.status, ImageStatus::PendingUpload);
    assert!(image.path_name.starts_with(&format!("users/{}/", owner.user_id)));
    assert!(image.path_name.ends_with("-sunset-view.png"));

    wait_for_status(&state, &owner, ImageStatus::Committed).await?;
    assert!(storage.objects.lock().unwrap().contains_key(&image.path_name));

    let foreign = image_service::delete(
        &state,
        &owner,
        owner.user_id,
        DeleteImagesRequest {
            image_ids: vec![image.id, Uuid::new_v4()],
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::Validation(_))));

    image_service::delete(
        &state,
        &owner,
        owner.user_id,
        DeleteImagesRequest {
            image_ids: vec![image.id],
        },
    )
    .await?;

    // hidden from listings as soon as it is marked
    let listed = image_service::list(&state, &owner, owner.user_id)
        .await?
        .data
        .unwrap();
    assert!(listed.images.is_empty());

    for _ in 0..50 {
        if !storage.objects.lock().unwrap().contains_key(&image.path_name) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(!storage.objects.lock().unwrap().contains_key(&image.path_name));

    // two files with one name in one request keep separate objects
    let twins = vec![
        UploadedFile {
            file_name: "photo.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1],
        },
        UploadedFile {
            file_name: "photo.png".into(),
            content_type: "image/png".into(),
            bytes: vec![2],
        },
    ];
    let queued = image_service::upload(&state, &owner, owner.user_id, twins)
        .await?
        .data
        .unwrap();
    assert_ne!(queued.images[0].path_name, queued.images[1].path_name);

    wait_for_status(&state, &owner, ImageStatus::Committed).await?;
    let objects = storage.objects.lock().unwrap();
    assert_eq!(objects.get(&queued.images[0].path_name), Some(&vec![1u8]));
    assert_eq!(objects.get(&queued.images[1].path_name), Some(&vec![2u8]));
    drop(objects);

    Ok(())
}
