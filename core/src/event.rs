//! Lifecycle events emitted by the complaint service.
//!
//! RULE: the service never talks to the notification layer directly.
//! It returns events; `notify::Notifier` turns them into notification rows.

use crate::types::{ComplaintId, EntityId, Status, TenantId, Urgency, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    ComplaintCreated {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
        urgency: Urgency,
        sla_deadline: Option<DateTime<Utc>>,
    },
    ComplaintAssigned {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
        title: String,
        assignee_id: UserId,
        previous_assignee_id: Option<UserId>,
    },
    StatusChanged {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
        from: Status,
        to: Status,
    },
    ComplaintUpdated {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
    },
    /// A complaint was saved while already past its deadline.
    SlaOverdue {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
        assignee_id: Option<UserId>,
        sla_deadline: DateTime<Utc>,
    },
    CommentAdded {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
        comment_id: EntityId,
        author_id: Option<UserId>,
        author_name: String,
        assignee_id: Option<UserId>,
        submitted_by: Option<UserId>,
    },
    AttachmentAdded {
        tenant_id: TenantId,
        complaint_id: ComplaintId,
        reference: String,
        filename: String,
    },
    ComplaintDeleted {
        tenant_id: TenantId,
        reference: String,
    },
}

impl DeskEvent {
    /// Stable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DeskEvent::ComplaintCreated { .. }  => "complaint_created",
            DeskEvent::ComplaintAssigned { .. } => "complaint_assigned",
            DeskEvent::StatusChanged { .. }     => "status_changed",
            DeskEvent::ComplaintUpdated { .. }  => "complaint_updated",
            DeskEvent::SlaOverdue { .. }        => "sla_overdue",
            DeskEvent::CommentAdded { .. }      => "comment_added",
            DeskEvent::AttachmentAdded { .. }   => "attachment_added",
            DeskEvent::ComplaintDeleted { .. }  => "complaint_deleted",
        }
    }
}
