pub mod activity_service;
pub mod admin_service;
pub mod auth_service;
pub mod booking_service;
pub mod business_gate;
pub mod chatbot_service;
pub mod destination_service;
pub mod image_service;
pub mod profile_service;
pub mod recommendation_service;
