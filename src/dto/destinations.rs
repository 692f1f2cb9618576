use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Destination;

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupedDestinations {
    pub active: Vec<Destination>,
    pub banned: Vec<Destination>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingSummary {
    pub business_user_id: Uuid,
    pub rating: f64,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

/// A booking as seen by the business that receives it.
#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessBooking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub booking_date: NaiveDate,
    pub booking_time: String,
}

/// A booking as seen by the customer who made it.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserBooking {
    pub id: Uuid,
    pub business_user_id: Uuid,
    pub business_name: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
}
