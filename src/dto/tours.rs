use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{GuideAssignment, Tour, TourStatus};

#[derive(Debug, Serialize, ToSchema)]
pub struct TourList {
    pub items: Vec<Tour>,
}

/// A tour with its guide set, as shown on the detail page.
#[derive(Debug, Serialize, ToSchema)]
pub struct TourWithGuides {
    pub tour: Tour,
    pub guides: Vec<GuideAssignment>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTourRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub max_guests: i32,
    pub duration_days: i32,
    pub status: Option<TourStatus>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub max_guests: Option<i32>,
    pub duration_days: Option<i32>,
    pub status: Option<TourStatus>,
    pub is_featured: Option<bool>,
}

/// Raw upstream records; normalization happens server-side.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportRequest {
    pub records: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    pub imported: i64,
    pub skipped: i64,
}
