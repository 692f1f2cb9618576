pub mod activity;
pub mod admin;
pub mod auth;
pub mod chat;
pub mod destinations;
pub mod images;
pub mod profile;
