use std::collections::BTreeMap;

use axum_tour_booking_api::{
    dto::checkout::CheckoutRequest,
    dto::guides::SetTourGuidesRequest,
    entity::audit_logs::{Column as AuditCol, Entity as AuditLogs},
    entity::users::Entity as Users,
    error::AppError,
    models::{BookingStatus, PaymentStatus},
    payment::{
        self, CallbackOutcome, PARAM_AMOUNT, PARAM_CHECKSUM, PARAM_RESPONSE_CODE,
        PARAM_TRANSACTION_NO, PARAM_TXN_REF,
    },
    services::{booking_service, checkout_service, guide_service},
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

mod common;

fn checkout_request(tour_id: Uuid, date: NaiveDate, guests: i32) -> CheckoutRequest {
    CheckoutRequest {
        tour_id,
        tour_date: date,
        number_of_guests: guests,
        first_name: "An".into(),
        last_name: "Tran".into(),
        email: "an.tran@example.com".into(),
        phone: "+84 912 345 678".into(),
        agree_to_terms: true,
        guide_id: None,
        payment_method: "cash".into(),
        special_requests: None,
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, day).expect("valid date")
}

// Full lifecycle: checkout -> confirm (guide auto-assigned) -> complete,
// explicit guide choice, capacity boundary, payment reconciliation with
// idempotent replay, and cancel/refund ordering.
#[tokio::test]
async fn booking_lifecycle_and_payment_flow() -> anyhow::Result<()> {
    let Some(db) = common::setup_state().await? else {
        return Ok(());
    };
    let state = db.state;
    let admin = common::create_admin(&state).await?;

    let tour_id = common::seed_tour(&state, "Mekong Delta Day Trip", 1000, 4).await?;
    let g1 = common::seed_guide(&state, "Lan Nguyen", "lan@example.com").await?;
    let g2 = common::seed_guide(&state, "Minh Pham", "minh@example.com").await?;
    guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![g1, g2],
            default_guide_id: None,
        },
    )
    .await?;

    // Capacity: one over the limit fails, the limit itself books.
    let err = checkout_service::checkout(&state, checkout_request(tour_id, date(1), 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Capacity(_)), "got {err:?}");
    let boundary = checkout_service::checkout(&state, checkout_request(tour_id, date(1), 4))
        .await?
        .data
        .unwrap();
    assert_eq!(boundary.booking.number_of_guests, 4);

    // No explicit choice: the default guide services the booking.
    let resp = checkout_service::checkout(&state, checkout_request(tour_id, date(2), 2)).await?;
    let booking = resp.data.unwrap().booking;
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    assert_eq!(booking.total_amount, 2000);
    assert!(booking.assigned_guide_id.is_none());

    let confirmed = booking_service::confirm(&state, &admin, booking.id)
        .await?
        .data
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.assigned_guide_id, Some(g1));

    let completed = booking_service::complete(&state, &admin, booking.id)
        .await?
        .data
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    // Completing again is an illegal edge.
    let err = booking_service::complete(&state, &admin, booking.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // An explicit customer choice beats the default.
    let mut req = checkout_request(tour_id, date(3), 2);
    req.guide_id = Some(g2);
    let chosen = checkout_service::checkout(&state, req).await?.data.unwrap();
    let chosen = booking_service::confirm(&state, &admin, chosen.booking.id)
        .await?
        .data
        .unwrap();
    assert_eq!(chosen.assigned_guide_id, Some(g2));

    // Two confirmed bookings on one date exhaust the guide set; the third
    // goes unguided for manual assignment.
    let b1 = checkout_service::checkout(&state, checkout_request(tour_id, date(4), 1))
        .await?
        .data
        .unwrap()
        .booking;
    let b2 = checkout_service::checkout(&state, checkout_request(tour_id, date(4), 1))
        .await?
        .data
        .unwrap()
        .booking;
    let b3 = checkout_service::checkout(&state, checkout_request(tour_id, date(4), 1))
        .await?
        .data
        .unwrap()
        .booking;
    let b1 = booking_service::confirm(&state, &admin, b1.id).await?.data.unwrap();
    let b2 = booking_service::confirm(&state, &admin, b2.id).await?.data.unwrap();
    let b3 = booking_service::confirm(&state, &admin, b3.id).await?.data.unwrap();
    assert_eq!(b1.assigned_guide_id, Some(g1));
    assert_eq!(b2.assigned_guide_id, Some(g2));
    assert_eq!(b3.assigned_guide_id, None);

    // Payment reconciliation: first callback, replay, conflicting id, then
    // cancel, refund, refund again.
    let paid = checkout_service::checkout(&state, checkout_request(tour_id, date(5), 2))
        .await?
        .data
        .unwrap()
        .booking;
    booking_service::confirm(&state, &admin, paid.id).await?;

    let once =
        booking_service::reconcile_payment(&state, paid.id, "TX-1001", CallbackOutcome::Success)
            .await?;
    assert_eq!(once.payment_status, PaymentStatus::Paid);
    assert_eq!(once.payment_transaction_id.as_deref(), Some("TX-1001"));
    assert_eq!(once.status, BookingStatus::Confirmed, "status axis untouched");

    // Replaying the same transaction id is a no-op.
    let twice =
        booking_service::reconcile_payment(&state, paid.id, "TX-1001", CallbackOutcome::Success)
            .await?;
    assert_eq!(twice.payment_status, PaymentStatus::Paid);
    assert_eq!(twice.paid_at, once.paid_at);

    // A different transaction id against a paid booking is a double charge.
    let err =
        booking_service::reconcile_payment(&state, paid.id, "TX-9999", CallbackOutcome::Success)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let cancelled = booking_service::cancel(&state, &admin, paid.id, "customer request".into())
        .await?
        .data
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Paid, "cancel never refunds");
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("customer request"));

    let refunded = booking_service::refund(&state, &admin, paid.id)
        .await?
        .data
        .unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

    let err = booking_service::refund(&state, &admin, paid.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // The provider replaying its original success callback after the refund
    // is still a no-op; the refund must not be erased.
    let replayed =
        booking_service::reconcile_payment(&state, paid.id, "TX-1001", CallbackOutcome::Success)
            .await?;
    assert_eq!(replayed.payment_status, PaymentStatus::Refunded);
    assert_eq!(replayed.payment_transaction_id.as_deref(), Some("TX-1001"));

    // A new transaction id against a refunded booking conflicts, same as paid.
    let err =
        booking_service::reconcile_payment(&state, paid.id, "TX-2002", CallbackOutcome::Success)
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Checkout is audited, and admin actions trace back to the admin user.
    let audited = AuditLogs::find()
        .filter(AuditCol::Action.eq("checkout"))
        .count(&state.orm)
        .await?;
    assert!(audited > 0, "expected checkout audit rows");

    let admin_row = Users::find_by_id(admin.user_id)
        .one(&state.orm)
        .await?
        .expect("admin user row");
    let admin_actions = admin_row.find_related(AuditLogs).count(&state.orm).await?;
    assert!(admin_actions > 0, "expected audit rows linked to the admin");

    Ok(())
}

#[tokio::test]
async fn checkout_validation_and_redirect_payment() -> anyhow::Result<()> {
    let Some(db) = common::setup_state().await? else {
        return Ok(());
    };
    let state = db.state;
    let admin = common::create_admin(&state).await?;
    let tour_id = common::seed_tour(&state, "Ha Giang Loop", 5000, 8).await?;
    let g1 = common::seed_guide(&state, "Huong Le", "huong@example.com").await?;
    guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![g1],
            default_guide_id: None,
        },
    )
    .await?;

    // Bad form: every failing field reported, no booking created.
    let mut bad = checkout_request(tour_id, date(10), 2);
    bad.email = "nope".into();
    bad.phone = "".into();
    bad.agree_to_terms = false;
    let err = checkout_service::checkout(&state, bad).await.unwrap_err();
    match err {
        AppError::Validation(fields) => {
            let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, vec!["email", "phone", "agree_to_terms"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Redirect method: checkout hands back a signed provider URL.
    let mut req = checkout_request(tour_id, date(10), 2);
    req.payment_method = "vnpay".into();
    let resp = checkout_service::checkout(&state, req).await?.data.unwrap();
    let url = resp.payment_url.expect("payment url for redirect method");
    assert!(url.starts_with(&state.config.payment_base_url));
    assert!(url.contains(&format!("{PARAM_TXN_REF}={}", resp.booking.id)));
    assert!(url.contains(&format!("{PARAM_CHECKSUM}=")));
    assert_eq!(resp.booking.payment_status, PaymentStatus::Unpaid);

    // Provider calls back with a verifiable outcome.
    let mut params = BTreeMap::new();
    params.insert(PARAM_TXN_REF.to_string(), resp.booking.id.to_string());
    params.insert(
        PARAM_AMOUNT.to_string(),
        (resp.booking.total_amount * 100).to_string(),
    );
    params.insert(PARAM_TRANSACTION_NO.to_string(), "VNP14422574".to_string());
    params.insert(PARAM_RESPONSE_CODE.to_string(), "00".to_string());
    let checksum = payment::checksum_for(&state.config.payment_secret, &params);
    params.insert(PARAM_CHECKSUM.to_string(), checksum);

    let returned = checkout_service::payment_return(&state, params.clone())
        .await?
        .data
        .unwrap();
    assert_eq!(returned.booking.payment_status, PaymentStatus::Paid);
    assert_eq!(returned.booking.status, BookingStatus::Pending, "no auto-confirm");
    assert_eq!(
        returned.provider_transaction_id.as_deref(),
        Some("VNP14422574")
    );

    // A tampered callback is rejected and changes nothing.
    let mut tampered = params;
    tampered.insert(PARAM_AMOUNT.to_string(), "1".to_string());
    let err = checkout_service::payment_return(&state, tampered).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // So is a correctly signed callback with no provider transaction number.
    let mut no_txn = BTreeMap::new();
    no_txn.insert(PARAM_TXN_REF.to_string(), resp.booking.id.to_string());
    no_txn.insert(PARAM_RESPONSE_CODE.to_string(), "00".to_string());
    let checksum = payment::checksum_for(&state.config.payment_secret, &no_txn);
    no_txn.insert(PARAM_CHECKSUM.to_string(), checksum);
    let err = checkout_service::payment_return(&state, no_txn).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The confirmation screen re-fetches by code.
    let fetched = booking_service::get_by_code(&state, &resp.booking.booking_code)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.id, resp.booking.id);
    assert_eq!(fetched.payment_status, PaymentStatus::Paid);

    Ok(())
}

// Inactive tours read as absent to customers.
#[tokio::test]
async fn archived_tour_is_not_bookable() -> anyhow::Result<()> {
    let Some(db) = common::setup_state().await? else {
        return Ok(());
    };
    let state = db.state;
    let _admin = common::create_admin(&state).await?;
    let tour_id = common::seed_tour(&state, "Retired Tour", 1000, 4).await?;

    use axum_tour_booking_api::entity::tours::{ActiveModel as TourActive, Entity as Tours};
    use sea_orm::{ActiveModelTrait, Set};
    let tour = Tours::find_by_id(tour_id).one(&state.orm).await?.unwrap();
    let mut active: TourActive = tour.into();
    active.status = Set("archived".into());
    active.update(&state.orm).await?;

    let err = checkout_service::checkout(&state, checkout_request(tour_id, date(20), 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
