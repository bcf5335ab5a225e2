use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Booking;

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelBookingRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignGuideRequest {
    pub guide_id: Uuid,
}
