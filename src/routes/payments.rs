use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::checkout::PaymentReturnResponse,
    error::AppResult,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/return", get(payment_return))
}

/// Where the provider redirects the customer's browser after payment. The
/// params are checksum-verified and reconciled server-side; the response body
/// reflects the booking row, never the URL.
#[utoipa::path(
    get,
    path = "/api/payments/return",
    responses(
        (status = 200, description = "Callback verified and reconciled", body = ApiResponse<PaymentReturnResponse>),
        (status = 400, description = "Unverifiable callback; booking untouched"),
        (status = 409, description = "Conflicting transaction id"),
    ),
    tag = "Payments"
)]
pub async fn payment_return(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> AppResult<Json<ApiResponse<PaymentReturnResponse>>> {
    let resp = checkout_service::payment_return(&state, params).await?;
    Ok(Json(resp))
}
