use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Normal => "normal",
            Role::Business => "business",
            Role::Admin => "admin",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "banned")]
    Banned,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[sea_orm(string_value = "save")]
    Save,
    #[sea_orm(string_value = "rate")]
    Rate,
    #[sea_orm(string_value = "review")]
    Review,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Save => "save",
            ActivityType::Rate => "rate",
            ActivityType::Review => "review",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

impl SubscriptionType {
    /// Plan price in cents.
    pub fn price_cents(&self) -> i64 {
        match self {
            SubscriptionType::Monthly => 1499,
            SubscriptionType::Yearly => 14999,
        }
    }

    /// End of a period that starts at `start`.
    pub fn period_end(&self, start: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        let months = match self {
            SubscriptionType::Monthly => 1,
            SubscriptionType::Yearly => 12,
        };
        start
            .checked_add_months(chrono::Months::new(months))
            .unwrap_or(start)
    }
}

/// Lifecycle of an image row relative to the object store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    #[sea_orm(string_value = "pending_upload")]
    PendingUpload,
    #[sea_orm(string_value = "committed")]
    Committed,
    #[sea_orm(string_value = "pending_delete")]
    PendingDelete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn monthly_period_ends_one_calendar_month_later() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        let end = SubscriptionType::Monthly.period_end(start);
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn plan_prices_and_leap_day_rollover() {
        assert_eq!(SubscriptionType::Monthly.price_cents(), 1499);
        assert_eq!(SubscriptionType::Yearly.price_cents(), 14999);
        let start = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(
            SubscriptionType::Yearly.period_end(start),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap()
        );
    }
}
