use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Booking, SavedDestination, UserActivity};

#[derive(Debug, Deserialize, ToSchema)]
pub struct BusinessTargetRequest {
    pub business_user_id: Uuid,
}

/// A rating may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RatingInput {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateRequest {
    pub business_user_id: Uuid,
    pub rating: RatingInput,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    pub business_user_id: Uuid,
    #[validate(length(min = 1, message = "The review field is required."))]
    pub review: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRequest {
    pub business_user_id: Uuid,
    /// `YYYY-MM-DD`
    pub booking_date: String,
    /// `HH:MM`
    pub booking_time: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub remaining_slots: i64,
    pub is_last_slot: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedPayload {
    pub saved_destination: SavedDestination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityPayload {
    pub user_activity: UserActivity,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatedStatus {
    pub rated: bool,
    pub rating: Option<String>,
}
