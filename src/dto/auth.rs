use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::sea_orm_active_enums::{Role, SubscriptionType},
    models::UserDetail,
};

/// Registration body. The business fields are required only when `role` is `business`.
#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: String,
    pub role: Role,
    pub profile_img: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub business: BusinessFields,
    pub subscription_type: Option<SubscriptionType>,
    pub payment_method: Option<String>,
}

/// Profile fields shared by registration and profile edits.
#[derive(Deserialize, Debug, Default, Clone, Validate, ToSchema)]
pub struct BusinessFields {
    pub business_name: Option<String>,
    pub category_id: Option<Uuid>,
    pub district: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90."))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180."))]
    pub longitude: Option<f64>,
    /// `HH:MM`, 24-hour clock.
    pub opening_hour: Option<String>,
    /// `HH:MM`, 24-hour clock.
    pub closing_hour: Option<String>,
    pub main_img: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "The counter booking must be at least 0."))]
    pub counter_booking: Option<i32>,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthPayload {
    pub user: UserDetail,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}
