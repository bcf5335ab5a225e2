use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::guides::{GuideList, SetTourGuidesRequest, TourGuidesResponse},
    entity::{
        guides::{Column as GuideCol, Entity as Guides},
        tour_guides::{ActiveModel as TourGuideActive, Column as TourGuideCol, Entity as TourGuides},
        tours::Entity as Tours,
    },
    error::{AppError, AppResult, FieldError},
    middleware::auth::{AuthUser, ensure_admin},
    models::GuideAssignment,
    response::{ApiResponse, Meta},
    services::{assignment_from_entity, guide_from_entity},
    state::AppState,
};

pub async fn list_guides(
    state: &AppState,
    active: Option<bool>,
) -> AppResult<ApiResponse<GuideList>> {
    let mut finder = Guides::find().order_by_asc(GuideCol::FullName);
    if let Some(active) = active {
        finder = finder.filter(GuideCol::IsActive.eq(active));
    }

    let items = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(guide_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Guides",
        GuideList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_guide(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<crate::models::Guide>> {
    let guide = Guides::find_by_id(id).one(&state.orm).await?;
    match guide {
        Some(g) => Ok(ApiResponse::success(
            "OK",
            guide_from_entity(g),
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}

/// Replace a tour's guide set. With guides present there is always exactly
/// one default: an explicit one must be a member of the set, and with none
/// given the first id silently becomes default, matching what the booking
/// office expects when they add the first guide.
pub async fn set_tour_guides(
    state: &AppState,
    user: &AuthUser,
    tour_id: Uuid,
    payload: SetTourGuidesRequest,
) -> AppResult<ApiResponse<TourGuidesResponse>> {
    ensure_admin(user)?;

    let mut guide_ids: Vec<Uuid> = Vec::with_capacity(payload.guide_ids.len());
    for id in payload.guide_ids {
        if !guide_ids.contains(&id) {
            guide_ids.push(id);
        }
    }

    let txn = state.orm.begin().await?;

    if Tours::find_by_id(tour_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let known = Guides::find()
        .filter(GuideCol::Id.is_in(guide_ids.clone()))
        .all(&txn)
        .await?;
    if known.len() != guide_ids.len() {
        return Err(AppError::NotFound);
    }

    let default_guide_id = match payload.default_guide_id {
        Some(id) if !guide_ids.contains(&id) => {
            return Err(AppError::Validation(vec![FieldError::new(
                "default_guide_id",
                "must be one of guide_ids",
            )]));
        }
        Some(id) => Some(id),
        None => guide_ids.first().copied(),
    };

    TourGuides::delete_many()
        .filter(TourGuideCol::TourId.eq(tour_id))
        .exec(&txn)
        .await?;

    let mut assignments: Vec<GuideAssignment> = Vec::with_capacity(guide_ids.len());
    for (position, guide_id) in guide_ids.iter().enumerate() {
        let row = TourGuideActive {
            id: Set(Uuid::new_v4()),
            tour_id: Set(tour_id),
            guide_id: Set(*guide_id),
            is_default: Set(Some(*guide_id) == default_guide_id),
            position: Set(position as i32),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        assignments.push(assignment_from_entity(row));
    }

    txn.commit().await?;

    audit(state, user, "tour_guides_set", tour_id).await;

    Ok(ApiResponse::success(
        "Tour guides updated",
        TourGuidesResponse {
            tour_id,
            assignments,
        },
        Some(Meta::empty()),
    ))
}

/// Remove one guide from a tour's set. Removing the default promotes the
/// earliest remaining guide by insertion order; an emptied set has no default.
pub async fn remove_guide(
    state: &AppState,
    user: &AuthUser,
    tour_id: Uuid,
    guide_id: Uuid,
) -> AppResult<ApiResponse<TourGuidesResponse>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let existing = TourGuides::find()
        .filter(TourGuideCol::TourId.eq(tour_id))
        .filter(TourGuideCol::GuideId.eq(guide_id))
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };
    let was_default = existing.is_default;

    TourGuides::delete_by_id(existing.id).exec(&txn).await?;

    let mut remaining = TourGuides::find()
        .filter(TourGuideCol::TourId.eq(tour_id))
        .order_by_asc(TourGuideCol::Position)
        .all(&txn)
        .await?;

    if was_default {
        if let Some(first) = remaining.first().cloned() {
            let mut active: TourGuideActive = first.into();
            active.is_default = Set(true);
            let promoted = active.update(&txn).await?;
            remaining[0] = promoted;
        }
    }

    txn.commit().await?;

    audit(state, user, "tour_guide_remove", tour_id).await;

    Ok(ApiResponse::success(
        "Guide removed",
        TourGuidesResponse {
            tour_id,
            assignments: remaining.into_iter().map(assignment_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

/// The tour's guide set in insertion order, for the detail view.
pub async fn assignments_for_tour<C: ConnectionTrait>(
    conn: &C,
    tour_id: Uuid,
) -> AppResult<Vec<GuideAssignment>> {
    let rows = TourGuides::find()
        .filter(TourGuideCol::TourId.eq(tour_id))
        .order_by_asc(TourGuideCol::Position)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(assignment_from_entity).collect())
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, tour_id: Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("tour_guides"),
        Some(serde_json::json!({ "tour_id": tour_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
