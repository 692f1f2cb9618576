pub mod audit_logs;
pub mod bookings;
pub mod business_profiles;
pub mod categories;
pub mod images;
pub mod revoked_tokens;
pub mod saved_destinations;
pub mod sea_orm_active_enums;
pub mod subscriptions;
pub mod user_activities;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use business_profiles::Entity as BusinessProfiles;
pub use categories::Entity as Categories;
pub use images::Entity as Images;
pub use revoked_tokens::Entity as RevokedTokens;
pub use saved_destinations::Entity as SavedDestinations;
pub use subscriptions::Entity as Subscriptions;
pub use user_activities::Entity as UserActivities;
pub use users::Entity as Users;
