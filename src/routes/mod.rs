use axum::Router;

use crate::state::AppState;

pub mod activity;
pub mod admin;
pub mod auth;
pub mod categories;
pub mod destinations;
pub mod doc;
pub mod health;
pub mod images;
pub mod profile;
pub mod recommendations;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
// Each module declares its full paths because several share a prefix.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(profile::router())
        .merge(activity::router())
        .merge(categories::router())
        .merge(destinations::router())
        .merge(users::router())
        .merge(recommendations::router())
        .merge(images::router())
        .merge(admin::router())
}
