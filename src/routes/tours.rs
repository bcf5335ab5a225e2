use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::guides::{SetTourGuidesRequest, TourGuidesResponse},
    dto::tours::{CreateTourRequest, TourList, TourWithGuides, UpdateTourRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Tour,
    response::ApiResponse,
    routes::params::TourQuery,
    services::{catalog_service, guide_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tours).post(create_tour))
        .route("/{id}", get(get_tour).put(update_tour))
        .route("/{id}/guides", put(set_tour_guides))
        .route("/{id}/guides/{guide_id}", delete(remove_tour_guide))
}

#[utoipa::path(
    get,
    path = "/api/tours",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name search"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("featured" = Option<bool>, Query, description = "Only featured tours")
    ),
    responses(
        (status = 200, description = "List tours", body = ApiResponse<TourList>),
    ),
    tag = "Tours"
)]
pub async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<TourQuery>,
) -> AppResult<Json<ApiResponse<TourList>>> {
    let resp = catalog_service::list_tours(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/tours/{id}", tag = "Tours")]
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TourWithGuides>>> {
    let resp = catalog_service::get_tour(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tours",
    request_body = CreateTourRequest,
    responses(
        (status = 200, description = "Create tour (admin only)", body = ApiResponse<Tour>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn create_tour(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTourRequest>,
) -> AppResult<Json<ApiResponse<Tour>>> {
    let resp = catalog_service::create_tour(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/tours/{id}",
    request_body = UpdateTourRequest,
    responses(
        (status = 200, description = "Update tour (admin only)", body = ApiResponse<Tour>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn update_tour(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTourRequest>,
) -> AppResult<Json<ApiResponse<Tour>>> {
    let resp = catalog_service::update_tour(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/tours/{id}/guides",
    request_body = SetTourGuidesRequest,
    responses(
        (status = 200, description = "Replace the tour's guide set", body = ApiResponse<TourGuidesResponse>),
        (status = 400, description = "Default guide not in set"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown tour or guide"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn set_tour_guides(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTourGuidesRequest>,
) -> AppResult<Json<ApiResponse<TourGuidesResponse>>> {
    let resp = guide_service::set_tour_guides(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/tours/{id}/guides/{guide_id}",
    responses(
        (status = 200, description = "Remove a guide; default auto-promotes", body = ApiResponse<TourGuidesResponse>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn remove_tour_guide(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, guide_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<TourGuidesResponse>>> {
    let resp = guide_service::remove_guide(&state, &user, id, guide_id).await?;
    Ok(Json(resp))
}
