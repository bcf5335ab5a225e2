use axum_tour_booking_api::{
    dto::guides::SetTourGuidesRequest,
    error::AppError,
    services::guide_service,
};
use uuid::Uuid;

mod common;

// Replacing a tour's guide set keeps exactly one default: explicit when
// given, otherwise the first listed guide.
#[tokio::test]
async fn set_guides_enforces_single_default() -> anyhow::Result<()> {
    let Some(db) = common::setup_state().await? else {
        return Ok(());
    };
    let state = db.state;
    let admin = common::create_admin(&state).await?;
    let tour_id = common::seed_tour(&state, "Hoi An Old Town Walk", 650, 15).await?;
    let g1 = common::seed_guide(&state, "Lan Nguyen", "lan@example.com").await?;
    let g2 = common::seed_guide(&state, "Minh Pham", "minh@example.com").await?;
    let g3 = common::seed_guide(&state, "Huong Le", "huong@example.com").await?;

    // No explicit default: the first guide is promoted.
    let resp = guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![g1, g2],
            default_guide_id: None,
        },
    )
    .await?
    .data
    .unwrap();
    let defaults: Vec<Uuid> = resp
        .assignments
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.guide_id)
        .collect();
    assert_eq!(defaults, vec![g1]);

    // Explicit default wins, and the order of guide_ids is the stored order.
    let resp = guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![g1, g2, g3],
            default_guide_id: Some(g3),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(resp.assignments.len(), 3);
    let order: Vec<Uuid> = resp.assignments.iter().map(|a| a.guide_id).collect();
    assert_eq!(order, vec![g1, g2, g3]);
    let defaults: Vec<Uuid> = resp
        .assignments
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.guide_id)
        .collect();
    assert_eq!(defaults, vec![g3]);

    // A default outside the set is a validation error, not a silent pick.
    let err = guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![g1],
            default_guide_id: Some(g2),
        },
    )
    .await
    .unwrap_err();
    match err {
        AppError::Validation(fields) => {
            assert_eq!(fields[0].field, "default_guide_id");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Unknown guide ids and unknown tours read as absent.
    let err = guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![Uuid::new_v4()],
            default_guide_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = guide_service::set_tour_guides(
        &state,
        &admin,
        Uuid::new_v4(),
        SetTourGuidesRequest {
            guide_ids: vec![g1],
            default_guide_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

// Removing the default promotes the earliest remaining guide; an emptied
// set simply has no default and no guides.
#[tokio::test]
async fn removing_default_promotes_next_guide() -> anyhow::Result<()> {
    let Some(db) = common::setup_state().await? else {
        return Ok(());
    };
    let state = db.state;
    let admin = common::create_admin(&state).await?;
    let tour_id = common::seed_tour(&state, "Sapa Trek", 2500, 10).await?;
    let g1 = common::seed_guide(&state, "Lan Nguyen", "lan@example.com").await?;
    let g2 = common::seed_guide(&state, "Minh Pham", "minh@example.com").await?;

    guide_service::set_tour_guides(
        &state,
        &admin,
        tour_id,
        SetTourGuidesRequest {
            guide_ids: vec![g1, g2],
            default_guide_id: Some(g1),
        },
    )
    .await?;

    let resp = guide_service::remove_guide(&state, &admin, tour_id, g1)
        .await?
        .data
        .unwrap();
    assert_eq!(resp.assignments.len(), 1);
    assert_eq!(resp.assignments[0].guide_id, g2);
    assert!(resp.assignments[0].is_default, "next guide takes over as default");

    // Removing a non-default leaves the default alone; here it empties the set.
    let resp = guide_service::remove_guide(&state, &admin, tour_id, g2)
        .await?
        .data
        .unwrap();
    assert!(resp.assignments.is_empty());

    // Removing from an empty set is NotFound.
    let err = guide_service::remove_guide(&state, &admin, tour_id, g2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn guide_listing_filters_by_active() -> anyhow::Result<()> {
    let Some(db) = common::setup_state().await? else {
        return Ok(());
    };
    let state = db.state;
    let _admin = common::create_admin(&state).await?;
    let g1 = common::seed_guide(&state, "Lan Nguyen", "lan@example.com").await?;
    let g2 = common::seed_guide(&state, "Minh Pham", "minh@example.com").await?;

    use axum_tour_booking_api::entity::guides::{ActiveModel as GuideActive, Entity as Guides};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    let guide = Guides::find_by_id(g2).one(&state.orm).await?.unwrap();
    let mut active: GuideActive = guide.into();
    active.is_active = Set(false);
    active.update(&state.orm).await?;

    let all = guide_service::list_guides(&state, None).await?.data.unwrap();
    assert_eq!(all.items.len(), 2);

    let active_only = guide_service::list_guides(&state, Some(true))
        .await?
        .data
        .unwrap();
    let ids: Vec<Uuid> = active_only.items.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![g1]);

    Ok(())
}
