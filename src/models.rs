use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    bookings, business_profiles, categories, images, saved_destinations,
    sea_orm_active_enums::{ActivityType, ImageStatus, Role, SubscriptionType, UserStatus},
    subscriptions, user_activities, users,
};

/// Formats a time of day the way clients send it: `HH:MM`.
pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub profile_img: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            status: model.status,
            profile_img: model.profile_img,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// A user plus the business details that only exist for business accounts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_profile: Option<BusinessProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BusinessProfile {
    pub user_id: Uuid,
    pub business_name: String,
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hour: Option<String>,
    pub closing_hour: Option<String>,
    pub main_img: Option<String>,
    pub description: Option<String>,
    pub counter_booking: i32,
    /// Hourly slot starts between opening and closing.
    pub available_booking_slots: Vec<String>,
}

impl BusinessProfile {
    pub fn from_entity(model: business_profiles::Model, category_name: Option<String>) -> Self {
        let available_booking_slots =
            crate::services::booking_service::hourly_slots(model.opening_hour, model.closing_hour)
                .into_iter()
                .map(format_hhmm)
                .collect();
        Self {
            user_id: model.user_id,
            business_name: model.business_name,
            category_id: model.category_id,
            category_name,
            district: model.district,
            latitude: model.latitude,
            longitude: model.longitude,
            opening_hour: model.opening_hour.map(format_hhmm),
            closing_hour: model.closing_hour.map(format_hhmm),
            main_img: model.main_img,
            description: model.description,
            counter_booking: model.counter_booking,
            available_booking_slots,
        }
    }
}

/// A business profile as listed in the directory.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Destination {
    #[serde(flatten)]
    pub profile: BusinessProfile,
    pub user_name: Option<String>,
    pub rating: f64,
    pub reviews: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub id: Uuid,
    pub business_user_id: Uuid,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
    pub price: i64,
    pub payment_status: String,
}

impl From<subscriptions::Model> for Subscription {
    fn from(model: subscriptions::Model) -> Self {
        Self {
            id: model.id,
            business_user_id: model.business_user_id,
            subscription_type: model.subscription_type,
            start_date: model.start_date.with_timezone(&Utc),
            end_date: model.end_date.with_timezone(&Utc),
            active: model.active,
            price: model.price,
            payment_status: model.payment_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_user_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub created_at: DateTime<Utc>,
}

impl From<bookings::Model> for Booking {
    fn from(model: bookings::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            business_user_id: model.business_user_id,
            booking_date: model.booking_date,
            booking_time: format_hhmm(model.booking_time),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_user_id: Uuid,
    pub activity_type: ActivityType,
    pub activity_value: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user_activities::Model> for UserActivity {
    fn from(model: user_activities::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            business_user_id: model.business_user_id,
            activity_type: model.activity_type,
            activity_value: model.activity_value,
            category: model.category,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedDestination {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<saved_destinations::Model> for SavedDestination {
    fn from(model: saved_destinations::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            business_user_id: model.business_user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Image {
    pub id: Uuid,
    pub url: String,
    pub path_name: String,
    pub status: ImageStatus,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn from_entity(model: images::Model, url: String) -> Self {
        Self {
            id: model.id,
            url,
            path_name: model.path_name,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
