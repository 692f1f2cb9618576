use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Image;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteImagesRequest {
    #[validate(length(min = 1, message = "The image ids field is required."))]
    pub image_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageList {
    pub images: Vec<Image>,
}

/// Raw bytes of one uploaded file, as read from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
