//! Decides which guide services a booking at confirmation time. Precedence:
//! the customer's explicit choice, then the tour default, then the earliest
//! assigned guide by insertion order, and finally none (manual assignment).
//! Deterministic for a fixed store state, so re-running it is idempotent.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity::{
        bookings::{self, Column as BookingCol, Entity as Bookings},
        tour_guides::{self, Column as TourGuideCol, Entity as TourGuides},
    },
    error::AppResult,
    models::BookingStatus,
};

/// Pick the guide for `booking`, or None when nobody is free. Runs inside the
/// caller's confirmation transaction so the availability read and the status
/// write commit together.
pub async fn resolve<C: ConnectionTrait>(
    conn: &C,
    booking: &bookings::Model,
) -> AppResult<Option<Uuid>> {
    let assignments = TourGuides::find()
        .filter(TourGuideCol::TourId.eq(booking.tour_id))
        .order_by_asc(TourGuideCol::Position)
        .all(conn)
        .await?;

    for guide_id in candidate_order(&assignments, booking.requested_guide_id) {
        if is_available(conn, guide_id, booking.tour_date, booking.id).await? {
            return Ok(Some(guide_id));
        }
    }

    Ok(None)
}

/// A guide is free on a date unless some other confirmed booking holds them.
/// Pending bookings reserve nothing; completed and cancelled ones release.
pub async fn is_available<C: ConnectionTrait>(
    conn: &C,
    guide_id: Uuid,
    tour_date: chrono::NaiveDate,
    exclude_booking: Uuid,
) -> AppResult<bool> {
    let committed = Bookings::find()
        .filter(BookingCol::AssignedGuideId.eq(guide_id))
        .filter(BookingCol::TourDate.eq(tour_date))
        .filter(BookingCol::Status.eq(BookingStatus::Confirmed.as_str()))
        .filter(BookingCol::Id.ne(exclude_booking))
        .count(conn)
        .await?;
    Ok(committed == 0)
}

/// Candidate guides in precedence order. `assignments` must already be sorted
/// by position. A requested guide who is no longer in the set is ignored.
fn candidate_order(assignments: &[tour_guides::Model], requested: Option<Uuid>) -> Vec<Uuid> {
    let mut order: Vec<Uuid> = Vec::with_capacity(assignments.len());
    if let Some(requested) = requested {
        if assignments.iter().any(|a| a.guide_id == requested) {
            order.push(requested);
        }
    }
    if let Some(default) = assignments.iter().find(|a| a.is_default) {
        if !order.contains(&default.guide_id) {
            order.push(default.guide_id);
        }
    }
    for assignment in assignments {
        if !order.contains(&assignment.guide_id) {
            order.push(assignment.guide_id);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assignment(guide_id: Uuid, is_default: bool, position: i32) -> tour_guides::Model {
        tour_guides::Model {
            id: Uuid::new_v4(),
            tour_id: Uuid::new_v4(),
            guide_id,
            is_default,
            position,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn requested_guide_beats_default() {
        let g1 = Uuid::new_v4();
        let g2 = Uuid::new_v4();
        let set = vec![assignment(g1, true, 0), assignment(g2, false, 1)];
        assert_eq!(candidate_order(&set, Some(g2)), vec![g2, g1]);
    }

    #[test]
    fn default_beats_insertion_order() {
        let g1 = Uuid::new_v4();
        let g2 = Uuid::new_v4();
        let g3 = Uuid::new_v4();
        let set = vec![
            assignment(g1, false, 0),
            assignment(g2, true, 1),
            assignment(g3, false, 2),
        ];
        assert_eq!(candidate_order(&set, None), vec![g2, g1, g3]);
    }

    #[test]
    fn requested_guide_no_longer_in_set_is_ignored() {
        let g1 = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let set = vec![assignment(g1, true, 0)];
        assert_eq!(candidate_order(&set, Some(stranger)), vec![g1]);
    }

    #[test]
    fn empty_set_yields_no_candidates() {
        assert!(candidate_order(&[], Some(Uuid::new_v4())).is_empty());
        assert!(candidate_order(&[], None).is_empty());
    }

    #[test]
    fn order_is_deterministic() {
        let g1 = Uuid::new_v4();
        let g2 = Uuid::new_v4();
        let set = vec![assignment(g1, false, 0), assignment(g2, true, 1)];
        let first = candidate_order(&set, Some(g1));
        for _ in 0..10 {
            assert_eq!(candidate_order(&set, Some(g1)), first);
        }
    }
}
