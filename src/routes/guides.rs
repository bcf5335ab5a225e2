use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::guides::GuideList,
    error::AppResult,
    models::Guide,
    response::ApiResponse,
    routes::params::GuideQuery,
    services::guide_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_guides))
        .route("/{id}", get(get_guide))
}

#[utoipa::path(
    get,
    path = "/api/guides",
    params(("active" = Option<bool>, Query, description = "Only active guides")),
    responses((status = 200, description = "List guides", body = ApiResponse<GuideList>)),
    tag = "Guides"
)]
pub async fn list_guides(
    State(state): State<AppState>,
    Query(query): Query<GuideQuery>,
) -> AppResult<Json<ApiResponse<GuideList>>> {
    let resp = guide_service::list_guides(&state, query.active).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/guides/{id}", tag = "Guides")]
pub async fn get_guide(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Guide>>> {
    let resp = guide_service::get_guide(&state, id).await?;
    Ok(Json(resp))
}
