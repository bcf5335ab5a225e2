use chrono::Utc;

use crate::{
    entity::{bookings, guides, tour_guides, tours},
    error::AppResult,
    models::{Booking, BookingStatus, Guide, GuideAssignment, PaymentStatus, Tour, TourStatus},
};

pub mod admin_service;
pub mod assignment;
pub mod auth_service;
pub mod booking_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod guide_service;

pub(crate) fn tour_from_entity(model: tours::Model) -> AppResult<Tour> {
    let status = TourStatus::parse(&model.status)
        .ok_or_else(|| anyhow::anyhow!("invalid tour status {:?}", model.status))?;
    Ok(Tour {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        max_guests: model.max_guests,
        duration_days: model.duration_days,
        status,
        is_featured: model.is_featured,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn guide_from_entity(model: guides::Model) -> Guide {
    let languages = serde_json::from_value(model.languages).unwrap_or_default();
    Guide {
        id: model.id,
        full_name: model.full_name,
        email: model.email,
        phone: model.phone,
        languages,
        experience_years: model.experience_years,
        average_rating: model.average_rating,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn assignment_from_entity(model: tour_guides::Model) -> GuideAssignment {
    GuideAssignment {
        id: model.id,
        tour_id: model.tour_id,
        guide_id: model.guide_id,
        is_default: model.is_default,
        position: model.position,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn booking_from_entity(model: bookings::Model) -> AppResult<Booking> {
    let status = BookingStatus::parse(&model.status)
        .ok_or_else(|| anyhow::anyhow!("invalid booking status {:?}", model.status))?;
    let payment_status = PaymentStatus::parse(&model.payment_status)
        .ok_or_else(|| anyhow::anyhow!("invalid payment status {:?}", model.payment_status))?;
    Ok(Booking {
        id: model.id,
        booking_code: model.booking_code,
        tour_id: model.tour_id,
        customer_first_name: model.customer_first_name,
        customer_last_name: model.customer_last_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        tour_date: model.tour_date,
        number_of_guests: model.number_of_guests,
        requested_guide_id: model.requested_guide_id,
        assigned_guide_id: model.assigned_guide_id,
        status,
        payment_status,
        payment_method: model.payment_method,
        payment_transaction_id: model.payment_transaction_id,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        total_amount: model.total_amount,
        special_requests: model.special_requests,
        cancel_reason: model.cancel_reason,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
