use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        activity::{
            ActivityPayload, BookRequest, BookingOutcome, BusinessTargetRequest, RateRequest,
            RatedStatus, RatingInput, ReviewRequest, SavedPayload,
        },
        admin::ModerateUserRequest,
        auth::{AuthPayload, BusinessFields, LoginRequest, RegisterRequest, TokenResponse},
        chat::{ChatRequest, ChatResponse},
        destinations::{BusinessBooking, GroupedDestinations, RatingSummary, ReviewEntry, UserBooking},
        images::{DeleteImagesRequest, ImageList},
        profile::{UpdateProfileRequest, UpdateSubscriptionRequest},
    },
    entity::sea_orm_active_enums::{ActivityType, ImageStatus, Role, SubscriptionType, UserStatus},
    models::{
        Booking, BusinessProfile, Category, Destination, Image, SavedDestination, Subscription,
        User, UserActivity, UserDetail,
    },
    response::{ApiResponse, Meta, ResponseStatus},
    routes::{
        activity, admin, auth, categories, destinations, health, images, profile,
        recommendations, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::admin_login,
        auth::me,
        auth::logout,
        auth::refresh,
        profile::update_profile,
        profile::update_business_profile,
        profile::update_subscription,
        activity::save_destination,
        activity::unsave_destination,
        activity::rate_destination,
        activity::review_destination,
        activity::book_slot,
        categories::list_categories,
        destinations::list_destinations,
        destinations::grouped_destinations,
        destinations::destinations_by_name,
        destinations::destinations_by_category,
        destinations::destinations_by_district,
        destinations::destination_by_owner,
        destinations::business_bookings,
        destinations::destination_reviews,
        destinations::destination_rating,
        users::user_bookings,
        users::saved_destinations,
        users::check_rated,
        recommendations::recommend_destinations,
        recommendations::chatbot,
        images::list_images,
        images::upload_images,
        images::delete_images,
        admin::ban_user,
        admin::unban_user
    ),
    components(
        schemas(
            Role,
            UserStatus,
            ActivityType,
            SubscriptionType,
            ImageStatus,
            User,
            UserDetail,
            Category,
            BusinessProfile,
            Destination,
            Subscription,
            Booking,
            UserActivity,
            SavedDestination,
            Image,
            RegisterRequest,
            BusinessFields,
            LoginRequest,
            AuthPayload,
            TokenResponse,
            UpdateProfileRequest,
            UpdateSubscriptionRequest,
            BusinessTargetRequest,
            RatingInput,
            RateRequest,
            ReviewRequest,
            BookRequest,
            BookingOutcome,
            SavedPayload,
            ActivityPayload,
            RatedStatus,
            GroupedDestinations,
            RatingSummary,
            ReviewEntry,
            BusinessBooking,
            UserBooking,
            DeleteImagesRequest,
            ImageList,
            images::ImageUploadForm,
            ModerateUserRequest,
            ChatRequest,
            ChatResponse,
            health::HealthData,
            Meta,
            ResponseStatus,
            ApiResponse<UserDetail>,
            ApiResponse<AuthPayload>,
            ApiResponse<Vec<Destination>>,
            ApiResponse<BookingOutcome>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and tokens"),
        (name = "Profile", description = "Profile and subscription edits"),
        (name = "Activity", description = "Save, rate, review and book"),
        (name = "Destinations", description = "Directory queries"),
        (name = "Users", description = "Per-user bookings, saves and ratings"),
        (name = "Recommendations", description = "Recommendations and chatbot"),
        (name = "Images", description = "User image uploads"),
        (name = "Admin", description = "Moderation"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_api_path_is_documented() {
        let spec = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/register",
            "/api/activity/book",
            "/api/destinations/{user_id}",
            "/api/{user_id}/chatbot",
            "/api/users/{user_id}/images",
            "/api/users/ban",
        ] {
            assert!(spec.paths.paths.contains_key(path), "{path} missing");
        }
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
