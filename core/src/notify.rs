//! Notification fan-out. Delivery (mail, push) is outside this crate;
//! this module only decides who gets which in-app notification row.
//!
//! Fan-out is best-effort, like history appends: failures are logged.

use crate::{
    clock::Clock,
    error::DeskResult,
    event::DeskEvent,
    store::DeskStore,
    types::{ComplaintId, EntityId, TenantId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    ComplaintAssigned,
    ComplaintUpdated,
    ComplaintComment,
    SlaWarning,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info              => "INFO",
            NotificationKind::Success           => "SUCCESS",
            NotificationKind::Warning           => "WARNING",
            NotificationKind::Error             => "ERROR",
            NotificationKind::ComplaintAssigned => "COMPLAINT_ASSIGNED",
            NotificationKind::ComplaintUpdated  => "COMPLAINT_UPDATED",
            NotificationKind::ComplaintComment  => "COMPLAINT_COMMENT",
            NotificationKind::SlaWarning        => "SLA_WARNING",
            NotificationKind::System            => "SYSTEM",
        }
    }

    /// Unknown names read back from the store degrade to INFO.
    pub fn parse(s: &str) -> Self {
        match s {
            "SUCCESS"            => NotificationKind::Success,
            "WARNING"            => NotificationKind::Warning,
            "ERROR"              => NotificationKind::Error,
            "COMPLAINT_ASSIGNED" => NotificationKind::ComplaintAssigned,
            "COMPLAINT_UPDATED"  => NotificationKind::ComplaintUpdated,
            "COMPLAINT_COMMENT"  => NotificationKind::ComplaintComment,
            "SLA_WARNING"        => NotificationKind::SlaWarning,
            "SYSTEM"             => NotificationKind::System,
            _                    => NotificationKind::Info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub notification_id: EntityId,
    pub tenant_id: Option<TenantId>,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub complaint_id: Option<ComplaintId>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn about_complaint(
        recipient: &str,
        tenant_id: &str,
        complaint_id: &str,
        kind: NotificationKind,
        title: &str,
        message: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            notification_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: Some(tenant_id.to_string()),
            user_id: recipient.to_string(),
            kind,
            title: title.to_string(),
            message,
            link: Some(format!("/complaints/{complaint_id}")),
            complaint_id: Some(complaint_id.to_string()),
            is_read: false,
            read_at: None,
            created_at: at,
        }
    }
}

/// Pure mapping from one event to the notifications it produces.
pub fn notifications_for(event: &DeskEvent, at: DateTime<Utc>) -> Vec<Notification> {
    match event {
        DeskEvent::ComplaintAssigned {
            tenant_id,
            complaint_id,
            reference,
            title,
            assignee_id,
            ..
        } => vec![Notification::about_complaint(
            assignee_id,
            tenant_id,
            complaint_id,
            NotificationKind::ComplaintAssigned,
            "New complaint assigned",
            format!("Complaint {reference} has been assigned to you: {title}"),
            at,
        )],
        DeskEvent::SlaOverdue {
            tenant_id,
            complaint_id,
            reference,
            assignee_id: Some(assignee_id),
            ..
        } => vec![Notification::about_complaint(
            assignee_id,
            tenant_id,
            complaint_id,
            NotificationKind::SlaWarning,
            "SLA exceeded",
            format!("Complaint {reference} has passed its SLA deadline"),
            at,
        )],
        DeskEvent::CommentAdded {
            tenant_id,
            complaint_id,
            reference,
            author_id,
            author_name,
            assignee_id,
            submitted_by,
            ..
        } => {
            let mut out = Vec::new();
            if let Some(assignee) = assignee_id.as_ref().filter(|a| Some(*a) != author_id.as_ref()) {
                out.push(Notification::about_complaint(
                    assignee,
                    tenant_id,
                    complaint_id,
                    NotificationKind::ComplaintComment,
                    "New comment",
                    format!("New comment on {reference} by {author_name}"),
                    at,
                ));
            }
            if let Some(submitter) = submitted_by.as_ref().filter(|s| Some(*s) != author_id.as_ref()) {
                out.push(Notification::about_complaint(
                    submitter,
                    tenant_id,
                    complaint_id,
                    NotificationKind::ComplaintComment,
                    "New comment",
                    format!("New comment on your complaint {reference}"),
                    at,
                ));
            }
            out
        }
        _ => Vec::new(),
    }
}

pub struct Notifier<'a> {
    store: &'a DeskStore,
    clock: &'a dyn Clock,
}

impl<'a> Notifier<'a> {
    pub fn new(store: &'a DeskStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Persist the notifications for `events`. Returns how many were written.
    pub fn fan_out(&self, events: &[DeskEvent]) -> usize {
        let now = self.clock.now();
        let mut written = 0;
        for event in events {
            for notification in notifications_for(event, now) {
                match self.store.insert_notification(&notification) {
                    Ok(()) => written += 1,
                    Err(e) => log::warn!(
                        "notification for {} to {} dropped: {e}",
                        event.kind(),
                        notification.user_id
                    ),
                }
            }
        }
        written
    }

    pub fn unread(&self, user_id: &str) -> DeskResult<Vec<Notification>> {
        self.store.unread_notifications(user_id)
    }

    /// Returns false when the notification was already read or does not exist.
    pub fn mark_read(&self, notification_id: &str) -> DeskResult<bool> {
        self.store.mark_notification_read(notification_id, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, 10, 0, 0).unwrap()
    }

    fn comment(author: Option<&str>, assignee: Option<&str>, submitter: Option<&str>) -> DeskEvent {
        DeskEvent::CommentAdded {
            tenant_id: "t".into(),
            complaint_id: "c".into(),
            reference: "ACME-2025-00001".into(),
            comment_id: "k".into(),
            author_id: author.map(String::from),
            author_name: "Bo".into(),
            assignee_id: assignee.map(String::from),
            submitted_by: submitter.map(String::from),
        }
    }

    #[test]
    fn commenter_is_not_notified_of_their_own_comment() {
        let out = notifications_for(&comment(Some("agent"), Some("agent"), Some("desk")), at());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].user_id, "desk");
    }

    #[test]
    fn assignee_and_submitter_both_hear_about_third_party_comment() {
        let out = notifications_for(&comment(Some("auditor"), Some("agent"), Some("desk")), at());
        let recipients: Vec<_> = out.iter().map(|n| n.user_id.as_str()).collect();
        assert_eq!(recipients, ["agent", "desk"]);
    }

    #[test]
    fn overdue_without_assignee_notifies_nobody() {
        let event = DeskEvent::SlaOverdue {
            tenant_id: "t".into(),
            complaint_id: "c".into(),
            reference: "r".into(),
            assignee_id: None,
            sla_deadline: at(),
        };
        assert!(notifications_for(&event, at()).is_empty());
    }
}
