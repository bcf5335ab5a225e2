use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Booking;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub tour_id: Uuid,
    pub tour_date: NaiveDate,
    pub number_of_guests: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// The terms checkbox; checkout is refused until it is true.
    pub agree_to_terms: bool,
    /// Explicit guide choice, honored over the tour default at confirmation.
    pub guide_id: Option<Uuid>,
    /// "vnpay" redirects to the provider; anything else waits for an admin.
    pub payment_method: String,
    pub special_requests: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub booking: Booking,
    /// Present only for redirect payment methods.
    pub payment_url: Option<String>,
}

/// What the confirmation screen shows after the provider redirects back.
/// The booking is re-fetched server-side; URL params are informational only.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentReturnResponse {
    pub booking: Booking,
    pub provider_transaction_id: Option<String>,
}
