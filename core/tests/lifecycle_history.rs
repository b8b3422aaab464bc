//! Complaint lifecycle and the audit history it leaves behind.

mod common;

use chrono::Duration;
use common::{t0, Desk};
use complaintdesk_core::{
    complaint::{CommentKind, ComplaintPatch},
    directory::User,
    error::DeskError,
    event::DeskEvent,
    history::{HistoryAction, SLA_CONFIG_REFERENCE},
    store::ComplaintFilter,
    types::{Status, Urgency},
};

fn desk() -> Desk {
    let desk = Desk::new();
    desk.tenant("t1", "ACME");
    desk.category("t1", "water", "Water");
    desk.user("agent", Some("t1"), "AGENT");
    desk.user("reception", Some("t1"), "RECEPTION");
    desk
}

fn actions(desk: &Desk, complaint_id: &str) -> Vec<HistoryAction> {
    desk.service()
        .history(complaint_id)
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect()
}

#[test]
fn assign_then_resolve_records_each_step() {
    let desk = desk();
    let reception = desk.store.get_user("reception").unwrap();
    let c = desk.complaint("t1", Some(&reception), Some("water"), Urgency::Medium);
    assert_eq!(c.status, Status::New);

    desk.clock.advance(Duration::hours(1));
    let assigned = desk.service().assign(&c.complaint_id, None, "agent").unwrap();
    assert_eq!(assigned.record.status, Status::Assigned);
    assert_eq!(assigned.record.assigned_user.as_deref(), Some("agent"));

    desk.clock.advance(Duration::hours(2));
    let resolved = desk
        .service()
        .change_status(&c.complaint_id, None, Status::Resolved)
        .unwrap();
    assert!(resolved.events.iter().any(|e| matches!(
        e,
        DeskEvent::StatusChanged { from: Status::Assigned, to: Status::Resolved, .. }
    )));

    assert_eq!(
        actions(&desk, &c.complaint_id),
        vec![HistoryAction::Created, HistoryAction::Assigned, HistoryAction::StatusChanged]
    );

    let history = desk.service().history(&c.complaint_id).unwrap();
    let status_change = &history[2];
    let old = status_change.old_value.as_ref().unwrap();
    let new = status_change.new_value.as_ref().unwrap();
    assert_eq!(old["status"], "ASSIGNED");
    assert_eq!(new["status"], "RESOLVED");
    assert_eq!(history[0].user_id.as_deref(), Some("reception"));
}

#[test]
fn closed_at_is_stamped_once() {
    let desk = desk();
    let c = desk.complaint("t1", None, Some("water"), Urgency::Low);

    desk.clock.advance(Duration::hours(5));
    let resolved = desk
        .service()
        .change_status(&c.complaint_id, None, Status::Resolved)
        .unwrap()
        .record;
    let first_close = t0() + Duration::hours(5);
    assert_eq!(resolved.closed_at, Some(first_close));
    assert_eq!(resolved.resolution_time(), Some(5.0));

    desk.clock.advance(Duration::days(2));
    let closed = desk
        .service()
        .change_status(&c.complaint_id, None, Status::Closed)
        .unwrap()
        .record;
    assert_eq!(closed.closed_at, Some(first_close));

    let reopened = desk
        .service()
        .change_status(&c.complaint_id, None, Status::InProgress)
        .unwrap()
        .record;
    assert_eq!(reopened.closed_at, Some(first_close));
}

#[test]
fn references_are_sequential_per_tenant() {
    let desk = desk();
    desk.tenant("t2", "beta");

    let a = desk.complaint("t1", None, None, Urgency::Low);
    let b = desk.complaint("t1", None, None, Urgency::Low);
    let other = desk.complaint("t2", None, None, Urgency::Low);

    assert_eq!(a.reference, "ACME-2025-00001");
    assert_eq!(b.reference, "ACME-2025-00002");
    assert_eq!(other.reference, "BETA-2025-00001");
}

#[test]
fn deleted_complaint_history_stays_readable_by_reference() {
    let desk = desk();
    let c = desk.complaint("t1", None, Some("water"), Urgency::High);
    desk.clock.advance(Duration::minutes(30));
    desk.service().assign(&c.complaint_id, None, "agent").unwrap();

    desk.clock.advance(Duration::minutes(30));
    let entry = desk.service().delete(&c.complaint_id, None).unwrap().record;
    assert_eq!(entry.action, HistoryAction::Deleted);

    assert!(matches!(
        desk.store.get_complaint(&c.complaint_id),
        Err(DeskError::ComplaintNotFound { .. })
    ));
    assert!(desk.service().history(&c.complaint_id).unwrap().is_empty());

    let trail = desk.store.history_for_reference(&c.reference).unwrap();
    let kinds: Vec<_> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        kinds,
        vec![HistoryAction::Created, HistoryAction::Assigned, HistoryAction::Deleted]
    );
    assert!(trail.iter().all(|e| e.complaint_id.is_none()));
    let old = trail[2].old_value.as_ref().unwrap();
    assert_eq!(old["status"], "ASSIGNED");
    assert_eq!(old["title"], "Street light out");
}

#[test]
fn deleting_a_missing_complaint_fails() {
    let desk = desk();
    assert!(matches!(
        desk.service().delete("nope", None),
        Err(DeskError::ComplaintNotFound { .. })
    ));
}

#[test]
fn reassignment_is_recorded_as_such() {
    let desk = desk();
    desk.user("admin", Some("t1"), "TENANT_ADMIN");
    let c = desk.complaint("t1", None, None, Urgency::Low);

    desk.service().assign(&c.complaint_id, None, "agent").unwrap();
    desk.clock.advance(Duration::minutes(1));
    let outcome = desk.service().assign(&c.complaint_id, None, "admin").unwrap();

    assert!(outcome.events.iter().any(|e| matches!(
        e,
        DeskEvent::ComplaintAssigned { previous_assignee_id: Some(prev), assignee_id, .. }
            if prev == "agent" && assignee_id == "admin"
    )));
    assert_eq!(
        actions(&desk, &c.complaint_id),
        vec![HistoryAction::Created, HistoryAction::Assigned, HistoryAction::Reassigned]
    );
}

#[test]
fn assignee_must_be_staff_of_the_tenant() {
    let desk = desk();
    desk.tenant("t2", "BETA");
    desk.user("outsider", Some("t2"), "AGENT");
    let mut retired = desk.store.get_user("agent").unwrap();
    retired.user_id = "retired".into();
    retired.email = "retired@desk.test".into();
    retired.is_active = false;
    desk.store.insert_user(&retired).unwrap();
    let c = desk.complaint("t1", None, None, Urgency::Low);

    for candidate in ["reception", "outsider", "retired"] {
        let err = desk.service().assign(&c.complaint_id, None, candidate).unwrap_err();
        assert!(matches!(err, DeskError::InvalidAssignee { .. }), "{candidate}: {err}");
    }
    assert!(matches!(
        desk.service().assign(&c.complaint_id, None, "ghost"),
        Err(DeskError::UserNotFound { .. })
    ));

    let unchanged = desk.store.get_complaint(&c.complaint_id).unwrap();
    assert_eq!(unchanged.assigned_user, None);
    assert_eq!(unchanged.status, Status::New);
    assert_eq!(actions(&desk, &c.complaint_id), vec![HistoryAction::Created]);
}

#[test]
fn patch_that_changes_nothing_writes_nothing() {
    let desk = desk();
    let c = desk.complaint("t1", None, None, Urgency::Low);
    desk.clock.advance(Duration::hours(1));

    let same_status = ComplaintPatch::status(Status::New);
    let outcome = desk.service().update(&c.complaint_id, None, &same_status).unwrap();
    assert!(outcome.events.is_empty());
    assert_eq!(outcome.record.updated_at, t0());
    assert_eq!(actions(&desk, &c.complaint_id), vec![HistoryAction::Created]);
}

#[test]
fn title_edit_is_a_plain_update() {
    let desk = desk();
    let c = desk.complaint("t1", None, None, Urgency::Low);
    let patch = ComplaintPatch {
        title: Some("Street light flickering".into()),
        ..ComplaintPatch::default()
    };
    let outcome = desk.service().update(&c.complaint_id, None, &patch).unwrap();
    assert!(matches!(outcome.events[..], [DeskEvent::ComplaintUpdated { .. }]));
    assert_eq!(
        actions(&desk, &c.complaint_id),
        vec![HistoryAction::Created, HistoryAction::Updated]
    );
}

#[test]
fn comments_and_attachments_are_recorded() {
    let desk = desk();
    let agent = desk.store.get_user("agent").unwrap();
    let c = desk.complaint("t1", None, None, Urgency::Low);

    desk.service()
        .add_comment(&c.complaint_id, Some(&agent), CommentKind::Public, "On our way")
        .unwrap();
    desk.service()
        .add_attachment(&c.complaint_id, Some(&agent), "photo.jpg", "uploads/photo.jpg")
        .unwrap();

    assert_eq!(desk.store.comments_for(&c.complaint_id).unwrap().len(), 1);
    assert_eq!(desk.store.attachments_for(&c.complaint_id).unwrap()[0].filename, "photo.jpg");
    assert_eq!(
        actions(&desk, &c.complaint_id),
        vec![HistoryAction::Created, HistoryAction::CommentAdded, HistoryAction::AttachmentAdded]
    );
}

#[test]
fn removing_sla_config_leaves_an_audit_entry() {
    let desk = desk();
    let admin = desk.user("admin", Some("t1"), "TENANT_ADMIN");
    let config = desk
        .service()
        .set_sla_config("t1", "water", Urgency::High, 8)
        .unwrap();

    let entry = desk
        .service()
        .remove_sla_config(&config.sla_config_id, Some(&admin))
        .unwrap();
    assert_eq!(entry.action, HistoryAction::Updated);
    assert_eq!(entry.complaint_reference, SLA_CONFIG_REFERENCE);
    assert_eq!(entry.description, "SLA Config deleted for Water - HIGH");

    assert!(desk.store.list_sla_configs("t1").unwrap().is_empty());
    let stored = desk.store.history_for_reference(SLA_CONFIG_REFERENCE).unwrap();
    assert_eq!(stored.len(), 1);
    let old = stored[0].old_value.as_ref().unwrap();
    assert_eq!(old["category"], "Water");
    assert_eq!(old["urgency"], "HIGH");
    assert_eq!(old["delay_hours"], 8);
}

#[test]
fn visibility_follows_role() {
    let desk = desk();
    desk.tenant("t2", "BETA");
    let platform = desk.user("root", None, "SUPER_ADMIN");
    let agent = desk.store.get_user("agent").unwrap();
    let reception = desk.store.get_user("reception").unwrap();
    let orphan = desk.user("orphan", None, "AUDITOR");

    let mine = desk.complaint("t1", None, None, Urgency::Low);
    desk.complaint("t1", None, None, Urgency::Low);
    desk.complaint("t2", None, None, Urgency::Low);
    desk.service().assign(&mine.complaint_id, None, "agent").unwrap();

    let service = desk.service();
    let count = |user: &User| service.visible_complaints(user, ComplaintFilter::all(), None).unwrap().len();
    assert_eq!(count(&platform), 3);
    assert_eq!(count(&reception), 2);
    assert_eq!(count(&agent), 1);
    assert!(matches!(
        service.visible_complaints(&orphan, ComplaintFilter::all(), None),
        Err(DeskError::MissingTenant { .. })
    ));
}

#[test]
fn tenant_history_is_newest_first_and_tenant_scoped() {
    let desk = desk();
    desk.tenant("t2", "BETA");
    let first = desk.complaint("t1", None, None, Urgency::Low);
    desk.clock.advance(Duration::minutes(5));
    desk.complaint("t2", None, None, Urgency::Low);
    desk.clock.advance(Duration::minutes(5));
    desk.service().assign(&first.complaint_id, None, "agent").unwrap();

    let trail = desk.service().tenant_history("t1", 10).unwrap();
    let kinds: Vec<_> = trail.iter().map(|e| e.action).collect();
    assert_eq!(kinds, vec![HistoryAction::Assigned, HistoryAction::Created]);
    assert!(trail.iter().all(|e| e.complaint_reference.starts_with("ACME-")));
    assert_eq!(desk.service().tenant_history("t1", 1).unwrap().len(), 1);
}

#[test]
fn sla_config_removal_stands_when_its_audit_entry_cannot_be_stored() {
    let desk = desk();
    let config = desk
        .service()
        .set_sla_config("t1", "water", Urgency::High, 4)
        .unwrap();
    // Never inserted, so the history row's actor reference cannot resolve.
    let mut ghost = desk.store.get_user("agent").unwrap();
    ghost.user_id = "ghost".into();

    let entry = desk
        .service()
        .remove_sla_config(&config.sla_config_id, Some(&ghost))
        .unwrap();
    assert_eq!(entry.description, "SLA Config deleted for Water - HIGH");
    assert!(desk.store.list_sla_configs("t1").unwrap().is_empty());
    assert!(desk.store.history_for_reference(SLA_CONFIG_REFERENCE).unwrap().is_empty());
}

#[test]
fn clearing_the_assignee_reads_as_an_unassignment() {
    let desk = desk();
    let c = desk.complaint("t1", None, None, Urgency::Low);
    desk.service().assign(&c.complaint_id, None, "agent").unwrap();

    let patch = ComplaintPatch {
        assigned_user: Some(None),
        ..ComplaintPatch::default()
    };
    let outcome = desk.service().update(&c.complaint_id, None, &patch).unwrap();
    assert_eq!(outcome.record.assigned_user, None);

    let history = desk.service().history(&c.complaint_id).unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.action, HistoryAction::Reassigned);
    assert_eq!(last.description, "Complaint unassigned from agent");
    assert!(!last.description.contains("assigned to"));
    assert_eq!(last.new_value.as_ref().unwrap()["assigned_user_id"], serde_json::Value::Null);
}
