use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings},
        tours::{Column as TourCol, Entity as Tours},
    },
    error::{AppError, AppResult, FieldError, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Booking, BookingStatus, PaymentStatus, TourStatus},
    payment::CallbackOutcome,
    response::{ApiResponse, Meta},
    services::{assignment, booking_from_entity},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct CustomerSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct CreateBookingInput {
    pub tour_id: Uuid,
    pub tour_date: NaiveDate,
    pub number_of_guests: i32,
    pub customer: CustomerSnapshot,
    pub requested_guide_id: Option<Uuid>,
    pub payment_method: String,
    pub special_requests: Option<String>,
}

/// Create a booking in pending/unpaid. Only active tours are bookable; an
/// inactive, draft or archived tour reads as absent to customers.
pub async fn create(state: &AppState, input: CreateBookingInput) -> AppResult<Booking> {
    validate_snapshot(&input.customer)?;

    let txn = state.orm.begin().await?;

    let tour = Tours::find()
        .filter(TourCol::Id.eq(input.tour_id))
        .one(&txn)
        .await?;
    let tour = match tour {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };
    if TourStatus::parse(&tour.status) != Some(TourStatus::Active) {
        return Err(AppError::NotFound);
    }

    if input.number_of_guests < 1 || input.number_of_guests > tour.max_guests {
        return Err(AppError::Capacity(format!(
            "guests must be between 1 and {}",
            tour.max_guests
        )));
    }

    let booking_id = Uuid::new_v4();
    let booking_code = build_booking_code(booking_id);
    let total_amount = tour.price * (input.number_of_guests as i64);

    let booking = BookingActive {
        id: Set(booking_id),
        booking_code: Set(booking_code),
        tour_id: Set(tour.id),
        customer_first_name: Set(input.customer.first_name),
        customer_last_name: Set(input.customer.last_name),
        customer_email: Set(input.customer.email),
        customer_phone: Set(input.customer.phone),
        tour_date: Set(input.tour_date),
        number_of_guests: Set(input.number_of_guests),
        requested_guide_id: Set(input.requested_guide_id),
        assigned_guide_id: Set(None),
        status: Set(BookingStatus::Pending.as_str().into()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().into()),
        payment_method: Set(input.payment_method),
        payment_transaction_id: Set(None),
        paid_at: Set(None),
        total_amount: Set(total_amount),
        special_requests: Set(input.special_requests),
        cancel_reason: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    booking_from_entity(booking)
}

/// pending -> confirmed; runs the assignment resolver inside the same
/// transaction so the availability check and the write are one unit.
pub async fn confirm(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let booking = lock_booking(&txn, id).await?;
    let status = parse_status(&booking.status)?;
    if !status.can_transition_to(BookingStatus::Confirmed) {
        return Err(AppError::InvalidTransition(format!(
            "{} -> confirmed",
            booking.status
        )));
    }

    let guide_id = assignment::resolve(&txn, &booking).await?;
    if guide_id.is_none() {
        tracing::info!(booking_id = %booking.id, "no guide available, flagged for manual assignment");
    }

    let mut active: BookingActive = booking.into();
    active.status = Set(BookingStatus::Confirmed.as_str().into());
    active.assigned_guide_id = Set(guide_id);
    active.updated_at = Set(Utc::now().into());
    let booking = match active.update(&txn).await {
        Ok(b) => b,
        // The (guide, date) partial unique index lost us the race.
        Err(err) if is_unique_violation(&err) => {
            return Err(AppError::Conflict(
                "guide is already booked on this date".into(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    txn.commit().await?;

    audit(state, user, "booking_confirm", &booking.id).await;

    Ok(ApiResponse::success(
        "Booking confirmed",
        booking_from_entity(booking)?,
        Some(Meta::empty()),
    ))
}

/// confirmed -> completed.
pub async fn complete(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let booking = lock_booking(&txn, id).await?;
    let status = parse_status(&booking.status)?;
    if !status.can_transition_to(BookingStatus::Completed) {
        return Err(AppError::InvalidTransition(format!(
            "{} -> completed",
            booking.status
        )));
    }

    let mut active: BookingActive = booking.into();
    active.status = Set(BookingStatus::Completed.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let booking = active.update(&txn).await?;

    txn.commit().await?;

    audit(state, user, "booking_complete", &booking.id).await;

    Ok(ApiResponse::success(
        "Booking completed",
        booking_from_entity(booking)?,
        Some(Meta::empty()),
    ))
}

/// pending|confirmed -> cancelled. Never touches the payment axis: a paid
/// booking stays paid until an explicit refund.
pub async fn cancel(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    reason: String,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let booking = lock_booking(&txn, id).await?;
    let status = parse_status(&booking.status)?;
    if !status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::InvalidTransition(format!(
            "{} -> cancelled",
            booking.status
        )));
    }

    let mut active: BookingActive = booking.into();
    active.status = Set(BookingStatus::Cancelled.as_str().into());
    active.cancel_reason = Set(Some(reason));
    active.updated_at = Set(Utc::now().into());
    let booking = active.update(&txn).await?;

    txn.commit().await?;

    audit(state, user, "booking_cancel", &booking.id).await;

    Ok(ApiResponse::success(
        "Booking cancelled",
        booking_from_entity(booking)?,
        Some(Meta::empty()),
    ))
}

/// Requires cancelled + paid; the one legal road to refunded.
pub async fn refund(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let booking = lock_booking(&txn, id).await?;
    let status = parse_status(&booking.status)?;
    let payment_status = parse_payment_status(&booking.payment_status)?;
    if status != BookingStatus::Cancelled || payment_status != PaymentStatus::Paid {
        return Err(AppError::InvalidTransition(format!(
            "refund requires cancelled+paid, found {}+{}",
            booking.status, booking.payment_status
        )));
    }

    let mut active: BookingActive = booking.into();
    active.payment_status = Set(PaymentStatus::Refunded.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let booking = active.update(&txn).await?;

    txn.commit().await?;

    audit(state, user, "booking_refund", &booking.id).await;

    Ok(ApiResponse::success(
        "Booking refunded",
        booking_from_entity(booking)?,
        Some(Meta::empty()),
    ))
}

/// Apply a provider outcome. Idempotent on the transaction id: replaying a
/// callback that already landed is a no-op, however late it arrives and
/// whatever the payment state has moved to since (a refund stays refunded).
/// A *different* transaction id against a settled booking is evidence of a
/// double charge and conflicts. Never advances `status` -- the axes stay
/// independent.
pub async fn reconcile_payment(
    state: &AppState,
    booking_id: Uuid,
    provider_transaction_id: &str,
    outcome: CallbackOutcome,
) -> AppResult<Booking> {
    let txn = state.orm.begin().await?;

    let booking = lock_booking(&txn, booking_id).await?;
    let payment_status = parse_payment_status(&booking.payment_status)?;

    if booking.payment_transaction_id.as_deref() == Some(provider_transaction_id) {
        txn.commit().await?;
        return booking_from_entity(booking);
    }
    if payment_status == PaymentStatus::Paid || payment_status == PaymentStatus::Refunded {
        return Err(AppError::Conflict(format!(
            "booking already settled under transaction {:?}",
            booking.payment_transaction_id
        )));
    }

    let booking = match outcome {
        CallbackOutcome::Success => {
            let mut active: BookingActive = booking.into();
            active.payment_status = Set(PaymentStatus::Paid.as_str().into());
            active.payment_transaction_id = Set(Some(provider_transaction_id.to_string()));
            active.paid_at = Set(Some(Utc::now().into()));
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        CallbackOutcome::Processing => {
            let mut active: BookingActive = booking.into();
            active.payment_status = Set(PaymentStatus::Pending.as_str().into());
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
        // Failed attempts leave the booking exactly as it was.
        CallbackOutcome::Failed => booking,
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "payment_reconciled",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "transaction_id": provider_transaction_id,
            "payment_status": booking.payment_status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    booking_from_entity(booking)
}

/// Administrative hard removal; bypasses the lifecycle on purpose.
pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = Bookings::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit(state, user, "booking_delete", &id).await;

    Ok(ApiResponse::success(
        "Booking deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

/// Confirmation-screen lookup: the return path re-fetches by code instead of
/// trusting anything in the redirect URL.
pub async fn get_by_code(state: &AppState, code: &str) -> AppResult<ApiResponse<Booking>> {
    let booking = Bookings::find()
        .filter(BookingCol::BookingCode.eq(code))
        .one(&state.orm)
        .await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "OK",
        booking_from_entity(booking)?,
        Some(Meta::empty()),
    ))
}

async fn lock_booking(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> AppResult<crate::entity::bookings::Model> {
    let booking = Bookings::find()
        .filter(BookingCol::Id.eq(id))
        .lock(LockType::Update)
        .one(txn)
        .await?;
    match booking {
        Some(b) => Ok(b),
        None => Err(AppError::NotFound),
    }
}

fn parse_status(s: &str) -> AppResult<BookingStatus> {
    BookingStatus::parse(s)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid booking status {s:?}")))
}

fn parse_payment_status(s: &str) -> AppResult<PaymentStatus> {
    PaymentStatus::parse(s)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid payment status {s:?}")))
}

fn validate_snapshot(customer: &CustomerSnapshot) -> AppResult<()> {
    let mut errors = Vec::new();
    if customer.first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "is required"));
    }
    if customer.last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "is required"));
    }
    if customer.email.trim().is_empty() {
        errors.push(FieldError::new("email", "is required"));
    }
    if customer.phone.trim().is_empty() {
        errors.push(FieldError::new("phone", "is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn audit(state: &AppState, user: &AuthUser, action: &str, booking_id: &Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

fn build_booking_code(booking_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = booking_id.to_string();
    let short = &suffix[..8];
    format!("BK-{}-{}", date, short.to_uppercase())
}
