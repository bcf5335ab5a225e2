use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{AssignGuideRequest, BookingList},
    entity::{
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings},
        tour_guides::{Column as TourGuideCol, Entity as TourGuides},
    },
    error::{AppError, AppResult, FieldError, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Booking, BookingStatus},
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, SortOrder, normalize_pagination},
    services::{assignment, booking_from_entity},
    state::AppState,
};

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = normalize_pagination(query.page, query.per_page);

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(BookingCol::Status.eq(status.clone()));
    }
    if let Some(payment_status) = query.payment_status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(BookingCol::PaymentStatus.eq(payment_status.clone()));
    }

    let mut finder = Bookings::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(BookingCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BookingCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect::<AppResult<Vec<Booking>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(meta),
    ))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let booking = Bookings::find_by_id(id).one(&state.orm).await?;
    match booking {
        Some(b) => Ok(ApiResponse::success(
            "OK",
            booking_from_entity(b)?,
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}

/// Manual guide assignment for the bookings the resolver left unguided (or
/// to override its pick). The guide must belong to the tour's set and be
/// free on the booking's date; both rules hold here exactly as they do at
/// automatic assignment.
pub async fn assign_guide(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AssignGuideRequest,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let booking = Bookings::find()
        .filter(BookingCol::Id.eq(id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    if BookingStatus::parse(&booking.status) != Some(BookingStatus::Confirmed) {
        return Err(AppError::InvalidTransition(format!(
            "cannot assign a guide to a {} booking",
            booking.status
        )));
    }

    let member = TourGuides::find()
        .filter(TourGuideCol::TourId.eq(booking.tour_id))
        .filter(TourGuideCol::GuideId.eq(payload.guide_id))
        .one(&txn)
        .await?;
    if member.is_none() {
        return Err(AppError::Validation(vec![FieldError::new(
            "guide_id",
            "guide is not assigned to this tour",
        )]));
    }

    if !assignment::is_available(&txn, payload.guide_id, booking.tour_date, booking.id).await? {
        return Err(AppError::Conflict(
            "guide is already booked on this date".into(),
        ));
    }

    let mut active: BookingActive = booking.into();
    active.assigned_guide_id = Set(Some(payload.guide_id));
    active.updated_at = Set(Utc::now().into());
    let booking = match active.update(&txn).await {
        Ok(b) => b,
        Err(err) if is_unique_violation(&err) => {
            return Err(AppError::Conflict(
                "guide is already booked on this date".into(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_assign_guide",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "guide_id": payload.guide_id,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Guide assigned",
        booking_from_entity(booking)?,
        Some(Meta::empty()),
    ))
}
