//! SLA policy resolution and deadline assignment.

mod common;

use chrono::Duration;
use common::{t0, Desk};
use complaintdesk_core::{
    complaint::ComplaintPatch,
    error::DeskError,
    sla::SlaPolicyResolver,
    types::Urgency,
};

fn desk_with_water() -> Desk {
    let desk = Desk::new();
    desk.tenant("t1", "ACME");
    desk.category("t1", "water", "Water");
    desk
}

#[test]
fn configured_policy_sets_deadline_from_submission() {
    let desk = desk_with_water();
    desk.service()
        .set_sla_config("t1", "water", Urgency::High, 24)
        .unwrap();

    let c = desk.complaint("t1", None, Some("water"), Urgency::High);
    assert_eq!(c.submitted_at, Some(t0()));
    assert_eq!(c.sla_deadline, Some(t0() + Duration::hours(24)));

    let stored = desk.store.get_complaint(&c.complaint_id).unwrap();
    assert_eq!(stored.sla_deadline, c.sla_deadline);
}

#[test]
fn missing_policy_falls_back_to_default_table() {
    let desk = desk_with_water();
    // A HIGH row must not leak into LOW.
    desk.service()
        .set_sla_config("t1", "water", Urgency::High, 4)
        .unwrap();

    let c = desk.complaint("t1", None, Some("water"), Urgency::Low);
    assert_eq!(c.sla_deadline, Some(t0() + Duration::hours(72)));
}

#[test]
fn deadline_is_never_recomputed() {
    let desk = desk_with_water();
    let c = desk.complaint("t1", None, Some("water"), Urgency::Low);
    let first = c.sla_deadline;

    desk.service()
        .set_sla_config("t1", "water", Urgency::High, 2)
        .unwrap();
    desk.clock.advance(Duration::hours(3));
    let patch = ComplaintPatch {
        urgency: Some(Urgency::High),
        ..ComplaintPatch::default()
    };
    let updated = desk.service().update(&c.complaint_id, None, &patch).unwrap().record;

    assert_eq!(updated.urgency, Urgency::High);
    assert_eq!(updated.sla_deadline, first);
    assert_eq!(updated.submitted_at, Some(t0()));
}

#[test]
fn complaint_without_category_gets_no_deadline() {
    let desk = desk_with_water();
    let c = desk.complaint("t1", None, None, Urgency::High);
    assert_eq!(c.sla_deadline, None);
    assert!(!c.is_overdue(t0() + Duration::days(365)));
}

#[test]
fn category_added_later_uses_original_submission_time() {
    let desk = desk_with_water();
    let c = desk.complaint("t1", None, None, Urgency::Medium);

    desk.clock.advance(Duration::hours(10));
    let patch = ComplaintPatch {
        category_id: Some(Some("water".into())),
        ..ComplaintPatch::default()
    };
    let updated = desk.service().update(&c.complaint_id, None, &patch).unwrap().record;
    assert_eq!(updated.sla_deadline, Some(t0() + Duration::hours(48)));
}

#[test]
fn unknown_urgency_name_fails_fast() {
    let desk = desk_with_water();
    let resolver = SlaPolicyResolver::new(&desk.store, &desk.config.default_sla_hours);

    let err = resolver
        .resolve_delay_hours_named("t1", Some("water"), "URGENT")
        .unwrap_err();
    assert!(matches!(err, DeskError::UnknownUrgency { ref value } if value == "URGENT"));

    assert_eq!(
        resolver.resolve_delay_hours_named("t1", Some("water"), "MEDIUM").unwrap(),
        48
    );
}

#[test]
fn setting_a_policy_twice_replaces_the_delay() {
    let desk = desk_with_water();
    desk.service().set_sla_config("t1", "water", Urgency::High, 24).unwrap();
    desk.service().set_sla_config("t1", "water", Urgency::High, 12).unwrap();

    assert_eq!(desk.store.list_sla_configs("t1").unwrap().len(), 1);
    let c = desk.complaint("t1", None, Some("water"), Urgency::High);
    assert_eq!(c.sla_deadline, Some(t0() + Duration::hours(12)));
}

#[test]
fn non_positive_delay_is_rejected() {
    let desk = desk_with_water();
    let err = desk
        .service()
        .set_sla_config("t1", "water", Urgency::High, 0)
        .unwrap_err();
    assert!(matches!(err, DeskError::InvalidSlaDelay { hours: 0 }));
}
