use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutResponse},
    error::AppResult,
    models::Booking,
    response::ApiResponse,
    services::{booking_service, checkout_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/code/{code}", get(get_by_code))
}

#[utoipa::path(
    post,
    path = "/api/bookings/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Booking created; payment_url set for redirect methods", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Per-field validation errors or capacity exceeded"),
        (status = 404, description = "Tour not bookable"),
    ),
    tag = "Bookings"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let resp = checkout_service::checkout(&state, payload).await?;
    Ok(Json(resp))
}

/// Confirmation-screen lookup by the display code on the booking.
#[utoipa::path(get, path = "/api/bookings/code/{code}", tag = "Bookings")]
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::get_by_code(&state, &code).await?;
    Ok(Json(resp))
}
