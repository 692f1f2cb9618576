use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::auth::BusinessFields, entity::sea_orm_active_enums::SubscriptionType};

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    pub profile_img: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub business: BusinessFields,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub subscription_type: SubscriptionType,
    #[validate(length(min = 1, message = "The payment method field is required."))]
    pub payment_method: String,
}
