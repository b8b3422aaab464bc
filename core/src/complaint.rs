//! Complaint records and the values derived from them on read.
//!
//! Derived values (`is_overdue`, `is_urgent_unhandled`, `resolution_time`)
//! are free functions over plain fields. The methods on `ComplaintRecord`
//! only forward its own fields.

use crate::types::{CategoryId, ComplaintId, EntityId, Status, TenantId, Urgency, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintRecord {
    pub complaint_id: ComplaintId,
    pub tenant_id: TenantId,
    /// `<TENANT>-<YEAR>-<NNNNN>`, unique across the store.
    pub reference: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub urgency: Urgency,
    pub location: String,
    pub phone_number: String,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<EntityId>,
    pub submitted_by: Option<UserId>,
    pub assigned_user: Option<UserId>,
    /// Set once on first save, never changed afterwards.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Set once, the first time status enters RESOLVED or CLOSED.
    pub closed_at: Option<DateTime<Utc>>,
    /// Computed once if absent, never recomputed.
    pub sla_deadline: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ComplaintRecord {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self.status, self.sla_deadline, now)
    }

    pub fn is_urgent_unhandled(&self) -> bool {
        is_urgent_unhandled(self.urgency, self.status)
    }

    pub fn resolution_time(&self) -> Option<f64> {
        resolution_time_hours(self.submitted_at, self.closed_at)
    }
}

/// A deadline exists, the complaint is still open and the deadline has passed.
pub fn is_overdue(status: Status, sla_deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match sla_deadline {
        Some(deadline) => !status.is_terminal() && now > deadline,
        None => false,
    }
}

pub fn is_urgent_unhandled(urgency: Urgency, status: Status) -> bool {
    urgency == Urgency::High && Status::TO_HANDLE.contains(&status)
}

/// Hours between submission and closure; None until closed.
pub fn resolution_time_hours(
    submitted_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
) -> Option<f64> {
    let (submitted, closed) = (submitted_at?, closed_at?);
    Some((closed - submitted).num_seconds() as f64 / 3600.0)
}

/// Fields supplied when a complaint is registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub subcategory_id: Option<EntityId>,
}

/// A partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplaintPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub urgency: Option<Urgency>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub category_id: Option<Option<CategoryId>>,
    pub subcategory_id: Option<Option<EntityId>>,
    pub assigned_user: Option<Option<UserId>>,
}

impl ComplaintPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply onto `complaint`, returning whether anything changed.
    pub fn apply_to(&self, complaint: &mut ComplaintRecord) -> bool {
        let before = complaint.clone();
        if let Some(title) = &self.title {
            complaint.title = title.clone();
        }
        if let Some(description) = &self.description {
            complaint.description = description.clone();
        }
        if let Some(status) = self.status {
            complaint.status = status;
        }
        if let Some(urgency) = self.urgency {
            complaint.urgency = urgency;
        }
        if let Some(location) = &self.location {
            complaint.location = location.clone();
        }
        if let Some(phone) = &self.phone_number {
            complaint.phone_number = phone.clone();
        }
        if let Some(category) = &self.category_id {
            complaint.category_id = category.clone();
        }
        if let Some(subcategory) = &self.subcategory_id {
            complaint.subcategory_id = subcategory.clone();
        }
        if let Some(assignee) = &self.assigned_user {
            complaint.assigned_user = assignee.clone();
        }
        *complaint != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentKind {
    #[default]
    Internal,
    Public,
    System,
}

impl CommentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentKind::Internal => "INTERNAL",
            CommentKind::Public   => "PUBLIC",
            CommentKind::System   => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INTERNAL" => Some(CommentKind::Internal),
            "PUBLIC"   => Some(CommentKind::Public),
            "SYSTEM"   => Some(CommentKind::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub comment_id: EntityId,
    pub tenant_id: TenantId,
    pub complaint_id: ComplaintId,
    pub user_id: Option<UserId>,
    pub kind: CommentKind,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub attachment_id: EntityId,
    pub tenant_id: TenantId,
    pub complaint_id: ComplaintId,
    pub filename: String,
    pub stored_path: String,
    pub uploaded_by: Option<UserId>,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
    }

    #[test]
    fn terminal_complaints_are_never_overdue() {
        let deadline = Some(t0());
        let later = t0() + Duration::hours(5);
        for status in Status::TERMINAL {
            assert!(!is_overdue(status, deadline, later), "{status} must not be overdue");
        }
        assert!(is_overdue(Status::InProgress, deadline, later));
    }

    #[test]
    fn deadline_equal_to_now_is_not_overdue() {
        assert!(!is_overdue(Status::New, Some(t0()), t0()));
        assert!(!is_overdue(Status::New, None, t0() + Duration::days(30)));
    }

    #[test]
    fn urgent_unhandled_needs_high_and_untouched() {
        assert!(is_urgent_unhandled(Urgency::High, Status::New));
        assert!(is_urgent_unhandled(Urgency::High, Status::Received));
        assert!(!is_urgent_unhandled(Urgency::High, Status::Assigned));
        assert!(!is_urgent_unhandled(Urgency::Medium, Status::New));
    }

    #[test]
    fn resolution_time_is_undefined_until_closed() {
        assert_eq!(resolution_time_hours(Some(t0()), None), None);
        let closed = t0() + Duration::minutes(90);
        assert_eq!(resolution_time_hours(Some(t0()), Some(closed)), Some(1.5));
    }
}
