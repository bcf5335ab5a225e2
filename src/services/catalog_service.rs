use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::tours::{CreateTourRequest, ImportRequest, ImportSummary, TourList, TourWithGuides, UpdateTourRequest},
    entity::{
        guides::{ActiveModel as GuideActive, Entity as Guides},
        tours::{ActiveModel as TourActive, Column as TourCol, Entity as Tours},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Tour, TourStatus},
    normalize,
    response::{ApiResponse, Meta},
    routes::params::{SortOrder, TourQuery, normalize_pagination},
    services::{guide_service, tour_from_entity},
    state::AppState,
};

pub async fn list_tours(state: &AppState, query: TourQuery) -> AppResult<ApiResponse<TourList>> {
    let (page, limit, offset) = normalize_pagination(query.page, query.per_page);

    let mut condition = Condition::all();
    if let Some(q) = query.q.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(TourCol::Name.contains(q.clone()));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(TourCol::Status.eq(status.clone()));
    }
    if let Some(featured) = query.featured {
        condition = condition.add(TourCol::IsFeatured.eq(featured));
    }

    let mut finder = Tours::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(TourCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(TourCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(tour_from_entity)
        .collect::<AppResult<Vec<Tour>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Tours", TourList { items }, Some(meta)))
}

pub async fn get_tour(state: &AppState, id: Uuid) -> AppResult<ApiResponse<TourWithGuides>> {
    let tour = Tours::find_by_id(id).one(&state.orm).await?;
    let tour = match tour {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    let guides = guide_service::assignments_for_tour(&state.orm, tour.id).await?;

    Ok(ApiResponse::success(
        "OK",
        TourWithGuides {
            tour: tour_from_entity(tour)?,
            guides,
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_tour(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTourRequest,
) -> AppResult<ApiResponse<Tour>> {
    ensure_admin(user)?;

    if payload.max_guests < 1 {
        return Err(AppError::BadRequest("max_guests must be at least 1".into()));
    }

    let tour = TourActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        max_guests: Set(payload.max_guests),
        duration_days: Set(payload.duration_days),
        status: Set(payload.status.unwrap_or(TourStatus::Draft).as_str().into()),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit(state, user, "tour_create", tour.id).await;

    Ok(ApiResponse::success(
        "Tour created",
        tour_from_entity(tour)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_tour(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTourRequest,
) -> AppResult<ApiResponse<Tour>> {
    ensure_admin(user)?;

    let existing = Tours::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    let mut active: TourActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(max_guests) = payload.max_guests {
        if max_guests < 1 {
            return Err(AppError::BadRequest("max_guests must be at least 1".into()));
        }
        active.max_guests = Set(max_guests);
    }
    if let Some(duration_days) = payload.duration_days {
        active.duration_days = Set(duration_days);
    }
    if let Some(status) = payload.status {
        active.status = Set(status.as_str().into());
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    active.updated_at = Set(Utc::now().into());
    let tour = active.update(&state.orm).await?;

    audit(state, user, "tour_update", tour.id).await;

    Ok(ApiResponse::success(
        "Tour updated",
        tour_from_entity(tour)?,
        Some(Meta::empty()),
    ))
}

/// Bulk import of raw upstream tour records. Every record passes through the
/// normalizer first; a record without a usable name is counted as skipped.
pub async fn import_tours(
    state: &AppState,
    user: &AuthUser,
    payload: ImportRequest,
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let mut imported = 0i64;
    let mut skipped = 0i64;

    for raw in &payload.records {
        let record = normalize::normalize_tour(raw);
        if record.name.is_empty() {
            skipped += 1;
            continue;
        }
        let status = TourStatus::parse(&record.status).unwrap_or(TourStatus::Draft);

        let existing = match record.id {
            Some(id) => Tours::find_by_id(id).one(&txn).await?,
            None => None,
        };
        match existing {
            Some(model) => {
                let mut active: TourActive = model.into();
                active.name = Set(record.name);
                active.description = Set(record.description);
                active.price = Set(record.price);
                active.max_guests = Set(record.max_guests);
                active.duration_days = Set(record.duration_days);
                active.status = Set(status.as_str().into());
                active.is_featured = Set(record.is_featured);
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?;
            }
            None => {
                TourActive {
                    id: Set(record.id.unwrap_or_else(Uuid::new_v4)),
                    name: Set(record.name),
                    description: Set(record.description),
                    price: Set(record.price),
                    max_guests: Set(record.max_guests),
                    duration_days: Set(record.duration_days),
                    status: Set(status.as_str().into()),
                    is_featured: Set(record.is_featured),
                    created_at: NotSet,
                    updated_at: NotSet,
                }
                .insert(&txn)
                .await?;
            }
        }
        imported += 1;
    }

    txn.commit().await?;

    audit(state, user, "tours_import", Uuid::nil()).await;

    Ok(ApiResponse::success(
        "Import finished",
        ImportSummary { imported, skipped },
        Some(Meta::empty()),
    ))
}

/// Same ingest path for guide records.
pub async fn import_guides(
    state: &AppState,
    user: &AuthUser,
    payload: ImportRequest,
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let mut imported = 0i64;
    let mut skipped = 0i64;

    for raw in &payload.records {
        let record = normalize::normalize_guide(raw);
        if record.full_name.is_empty() || record.email.is_empty() {
            skipped += 1;
            continue;
        }
        let languages = serde_json::to_value(&record.languages)
            .map_err(|e| AppError::Internal(e.into()))?;

        let existing = match record.id {
            Some(id) => Guides::find_by_id(id).one(&txn).await?,
            None => None,
        };
        match existing {
            Some(model) => {
                let mut active: GuideActive = model.into();
                active.full_name = Set(record.full_name);
                active.email = Set(record.email);
                active.phone = Set(record.phone);
                active.languages = Set(languages);
                active.experience_years = Set(record.experience_years);
                active.average_rating = Set(record.average_rating);
                active.is_active = Set(record.is_active);
                active.update(&txn).await?;
            }
            None => {
                GuideActive {
                    id: Set(record.id.unwrap_or_else(Uuid::new_v4)),
                    full_name: Set(record.full_name),
                    email: Set(record.email),
                    phone: Set(record.phone),
                    languages: Set(languages),
                    experience_years: Set(record.experience_years),
                    average_rating: Set(record.average_rating),
                    is_active: Set(record.is_active),
                    created_at: NotSet,
                }
                .insert(&txn)
                .await?;
            }
        }
        imported += 1;
    }

    txn.commit().await?;

    audit(state, user, "guides_import", Uuid::nil()).await;

    Ok(ApiResponse::success(
        "Import finished",
        ImportSummary { imported, skipped },
        Some(Meta::empty()),
    ))
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, tour_id: Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("tours"),
        Some(serde_json::json!({ "tour_id": tour_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
