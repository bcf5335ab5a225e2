use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Guide, GuideAssignment};

#[derive(Debug, Serialize, ToSchema)]
pub struct GuideList {
    pub items: Vec<Guide>,
}

/// Replaces a tour's guide set. Order of `guide_ids` is the insertion order;
/// with no explicit default the first id becomes default.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTourGuidesRequest {
    pub guide_ids: Vec<Uuid>,
    pub default_guide_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TourGuidesResponse {
    pub tour_id: Uuid,
    pub assignments: Vec<GuideAssignment>,
}
