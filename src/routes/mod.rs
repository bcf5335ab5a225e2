use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod doc;
pub mod guides;
pub mod health;
pub mod params;
pub mod payments;
pub mod tours;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/tours", tours::router())
        .nest("/guides", guides::router())
        .nest("/bookings", bookings::router())
        .nest("/payments", payments::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
