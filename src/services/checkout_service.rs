//! Sequences the customer-facing checkout: validate the form, create the
//! booking, then hand off to the payment provider when the method redirects.
//! The booking row is the durable source of truth across the two hops; the
//! provider's return URL only tells us where to look.

use std::collections::BTreeMap;

use crate::{
    audit::log_audit,
    dto::checkout::{CheckoutRequest, CheckoutResponse, PaymentReturnResponse},
    error::{AppError, AppResult, FieldError},
    payment::{
        self, CallbackOutcome, PARAM_RESPONSE_CODE, PARAM_TRANSACTION_NO, PARAM_TXN_REF,
    },
    response::{ApiResponse, Meta},
    services::booking_service::{self, CreateBookingInput, CustomerSnapshot},
    state::AppState,
};

pub const METHOD_VNPAY: &str = "vnpay";

pub async fn checkout(
    state: &AppState,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let errors = validate_form(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let booking = booking_service::create(
        state,
        CreateBookingInput {
            tour_id: payload.tour_id,
            tour_date: payload.tour_date,
            number_of_guests: payload.number_of_guests,
            customer: CustomerSnapshot {
                first_name: payload.first_name.trim().to_string(),
                last_name: payload.last_name.trim().to_string(),
                email: payload.email.trim().to_string(),
                phone: payload.phone.trim().to_string(),
            },
            requested_guide_id: payload.guide_id,
            payment_method: payload.payment_method.clone(),
            special_requests: payload.special_requests,
        },
    )
    .await?;

    // Redirect methods get a signed provider URL; cash waits for an admin.
    let payment_url = if payload.payment_method == METHOD_VNPAY {
        Some(payment::build_payment_url(
            &state.config,
            booking.id,
            &booking.booking_code,
            booking.total_amount,
        ))
    } else {
        None
    };

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "checkout",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "payment_method": booking.payment_method,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutResponse {
            booking,
            payment_url,
        },
        Some(Meta::empty()),
    ))
}

/// The provider's browser-redirect return path. The checksum gates
/// reconciliation: an unverifiable callback is logged and rejected, and the
/// booking stays in whatever state it was (failing toward unpaid).
pub async fn payment_return(
    state: &AppState,
    params: BTreeMap<String, String>,
) -> AppResult<ApiResponse<PaymentReturnResponse>> {
    if !payment::verify_callback(&state.config.payment_secret, &params) {
        tracing::warn!("payment callback failed checksum verification");
        return Err(AppError::BadRequest("Invalid payment callback".into()));
    }

    let booking_id = params
        .get(PARAM_TXN_REF)
        .and_then(|v| uuid::Uuid::parse_str(v).ok())
        .ok_or_else(|| AppError::BadRequest("Invalid payment callback".into()))?;
    // A success/failure report without the provider's transaction number is
    // malformed; recording an empty id would defeat replay detection.
    let transaction_id = params
        .get(PARAM_TRANSACTION_NO)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Invalid payment callback".into()))?;
    let outcome = params
        .get(PARAM_RESPONSE_CODE)
        .map(|code| CallbackOutcome::from_response_code(code))
        .unwrap_or(CallbackOutcome::Failed);

    let booking =
        booking_service::reconcile_payment(state, booking_id, &transaction_id, outcome).await?;

    tracing::info!(
        booking_id = %booking.id,
        payment_status = booking.payment_status.as_str(),
        "payment callback reconciled"
    );

    Ok(ApiResponse::success(
        "Payment processed",
        PaymentReturnResponse {
            booking,
            provider_transaction_id: Some(transaction_id),
        },
        Some(Meta::empty()),
    ))
}

/// Per-field checkout validation; all failures are reported at once so the
/// form can mark every bad field in one round trip.
fn validate_form(payload: &CheckoutRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if payload.first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "is required"));
    }
    if payload.last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "is required"));
    }
    if !is_plausible_email(payload.email.trim()) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if payload.phone.trim().is_empty() {
        errors.push(FieldError::new("phone", "is required"));
    }
    if !payload.agree_to_terms {
        errors.push(FieldError::new("agree_to_terms", "must be accepted"));
    }
    errors
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
