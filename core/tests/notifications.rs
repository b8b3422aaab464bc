//! Notification fan-out from lifecycle operations.

mod common;

use chrono::Duration;
use common::Desk;
use complaintdesk_core::{
    complaint::CommentKind,
    notify::{NotificationKind, Notifier},
    types::Urgency,
};

fn desk() -> Desk {
    let desk = Desk::new();
    desk.tenant("t1", "ACME");
    desk.category("t1", "water", "Water");
    desk.user("agent", Some("t1"), "AGENT");
    desk.user("reception", Some("t1"), "RECEPTION");
    desk.user("admin", Some("t1"), "TENANT_ADMIN");
    desk
}

fn notifier(desk: &Desk) -> Notifier<'_> {
    Notifier::new(&desk.store, &desk.clock)
}

#[test]
fn assignment_notifies_the_assignee() {
    let desk = desk();
    let c = desk.complaint("t1", None, None, Urgency::Medium);
    desk.service().assign(&c.complaint_id, None, "agent").unwrap();

    let unread = notifier(&desk).unread("agent").unwrap();
    assert_eq!(unread.len(), 1);
    let n = &unread[0];
    assert_eq!(n.kind, NotificationKind::ComplaintAssigned);
    assert_eq!(n.complaint_id.as_deref(), Some(c.complaint_id.as_str()));
    assert_eq!(n.link.as_deref(), Some(format!("/complaints/{}", c.complaint_id).as_str()));
    assert!(n.message.contains(&c.reference));
    assert!(notifier(&desk).unread("admin").unwrap().is_empty());
}

#[test]
fn comment_reaches_assignee_and_submitter_but_not_author() {
    let desk = desk();
    let reception = desk.store.get_user("reception").unwrap();
    let agent = desk.store.get_user("agent").unwrap();
    let admin = desk.store.get_user("admin").unwrap();
    let c = desk.complaint("t1", Some(&reception), None, Urgency::Low);
    desk.service().assign(&c.complaint_id, None, "agent").unwrap();

    desk.service()
        .add_comment(&c.complaint_id, Some(&admin), CommentKind::Internal, "Please call back")
        .unwrap();
    let comments = |user: &str| {
        notifier(&desk)
            .unread(user)
            .unwrap()
            .into_iter()
            .filter(|n| n.kind == NotificationKind::ComplaintComment)
            .count()
    };
    assert_eq!(comments("agent"), 1);
    assert_eq!(comments("reception"), 1);
    assert_eq!(comments("admin"), 0);

    // The assignee commenting on their own complaint only tells the submitter.
    desk.service()
        .add_comment(&c.complaint_id, Some(&agent), CommentKind::Public, "Fixed")
        .unwrap();
    assert_eq!(comments("agent"), 1);
    assert_eq!(comments("reception"), 2);
}

#[test]
fn saving_an_overdue_complaint_warns_its_assignee() {
    let desk = desk();
    let c = desk.complaint("t1", None, Some("water"), Urgency::High);
    desk.clock.advance(Duration::hours(30));

    let outcome = desk.service().assign(&c.complaint_id, None, "agent").unwrap();
    assert!(outcome.events.iter().any(|e| e.kind() == "sla_overdue"));

    let kinds: Vec<NotificationKind> = notifier(&desk)
        .unread("agent")
        .unwrap()
        .into_iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationKind::ComplaintAssigned));
    assert!(kinds.contains(&NotificationKind::SlaWarning));
}

#[test]
fn mark_read_succeeds_once() {
    let desk = desk();
    let c = desk.complaint("t1", None, None, Urgency::Low);
    desk.service().assign(&c.complaint_id, None, "agent").unwrap();

    let id = notifier(&desk).unread("agent").unwrap()[0].notification_id.clone();
    assert!(notifier(&desk).mark_read(&id).unwrap());
    assert!(!notifier(&desk).mark_read(&id).unwrap());
    assert!(!notifier(&desk).mark_read("missing").unwrap());
    assert!(notifier(&desk).unread("agent").unwrap().is_empty());
}
