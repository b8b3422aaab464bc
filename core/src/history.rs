//! Complaint history: the append-only audit log.
//!
//! RULE: rows are inserted, never updated. The only column that ever
//! changes is `complaint_id`, which the store nulls when the complaint is
//! deleted; `complaint_reference` is stored, not joined, so the row stays
//! readable afterwards.
//!
//! Appends after a committed mutation are best-effort: `HistoryRecorder::record`
//! logs a failed write and returns None instead of failing the caller.

use crate::{
    complaint::ComplaintRecord,
    directory::User,
    error::{DeskError, DeskResult},
    store::DeskStore,
    types::{ComplaintId, EntityId, TenantId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Reference recorded for changes to SLA policy rows, which have no complaint.
pub const SLA_CONFIG_REFERENCE: &str = "SLA_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Created,
    StatusChanged,
    Assigned,
    Reassigned,
    CommentAdded,
    AttachmentAdded,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created         => "CREATED",
            HistoryAction::StatusChanged   => "STATUS_CHANGED",
            HistoryAction::Assigned        => "ASSIGNED",
            HistoryAction::Reassigned      => "REASSIGNED",
            HistoryAction::CommentAdded    => "COMMENT_ADDED",
            HistoryAction::AttachmentAdded => "ATTACHMENT_ADDED",
            HistoryAction::Updated         => "UPDATED",
            HistoryAction::Deleted         => "DELETED",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        Ok(match s {
            "CREATED"          => HistoryAction::Created,
            "STATUS_CHANGED"   => HistoryAction::StatusChanged,
            "ASSIGNED"         => HistoryAction::Assigned,
            "REASSIGNED"       => HistoryAction::Reassigned,
            "COMMENT_ADDED"    => HistoryAction::CommentAdded,
            "ATTACHMENT_ADDED" => HistoryAction::AttachmentAdded,
            "UPDATED"          => HistoryAction::Updated,
            "DELETED"          => HistoryAction::Deleted,
            other => return Err(DeskError::UnknownAction { value: other.to_string() }),
        })
    }
}

/// Unstructured key/value snapshot of the fields an action touched.
pub type Snapshot = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub history_id: EntityId,
    pub tenant_id: TenantId,
    pub complaint_id: Option<ComplaintId>,
    pub complaint_reference: String,
    pub action: HistoryAction,
    pub user_id: Option<UserId>,
    pub old_value: Option<Snapshot>,
    pub new_value: Option<Snapshot>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(
        tenant_id: &str,
        complaint_id: Option<&str>,
        reference: &str,
        action: HistoryAction,
        actor: Option<&User>,
        description: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            history_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            complaint_id: complaint_id.map(String::from),
            complaint_reference: reference.to_string(),
            action,
            user_id: actor.map(|u| u.user_id.clone()),
            old_value: None,
            new_value: None,
            description,
            created_at: at,
        }
    }

    fn for_complaint(
        complaint: &ComplaintRecord,
        action: HistoryAction,
        actor: Option<&User>,
        description: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            &complaint.tenant_id,
            Some(&complaint.complaint_id),
            &complaint.reference,
            action,
            actor,
            description,
            at,
        )
    }

    pub fn with_old(mut self, old: Snapshot) -> Self {
        self.old_value = Some(old);
        self
    }

    pub fn with_new(mut self, new: Snapshot) -> Self {
        self.new_value = Some(new);
        self
    }

    pub fn created(complaint: &ComplaintRecord, actor: Option<&User>, at: DateTime<Utc>) -> Self {
        let mut new = Snapshot::new();
        new.insert("title".into(), Value::from(complaint.title.clone()));
        new.insert("status".into(), Value::from(complaint.status.as_str()));
        new.insert("urgency".into(), Value::from(complaint.urgency.as_str()));
        Self::for_complaint(
            complaint,
            HistoryAction::Created,
            actor,
            format!("Complaint created: {}", complaint.reference),
            at,
        )
        .with_new(new)
    }

    /// Entry for a generic update. The action is derived from what changed
    /// between the two tracked snapshots.
    pub fn updated(
        complaint: &ComplaintRecord,
        actor: Option<&User>,
        old: Snapshot,
        new: Snapshot,
        assignee_name: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        let action = classify_update(&old, &new);
        let description = match action {
            HistoryAction::StatusChanged => format!(
                "Status changed from {} to {}",
                snapshot_str(&old, "status"),
                snapshot_str(&new, "status"),
            ),
            HistoryAction::Assigned | HistoryAction::Reassigned => match assignee_name {
                Some(name) => format!("Complaint assigned to {name}"),
                None => format!(
                    "Complaint unassigned from {}",
                    snapshot_str(&old, "assigned_user_id")
                ),
            },
            _ => format!("Complaint {} updated", complaint.reference),
        };
        Self::for_complaint(complaint, action, actor, description, at)
            .with_old(old)
            .with_new(new)
    }

    /// ASSIGNED when nobody held the complaint before, REASSIGNED otherwise.
    pub fn assignment(
        complaint: &ComplaintRecord,
        actor: Option<&User>,
        previous: Option<&str>,
        assignee: &User,
        at: DateTime<Utc>,
    ) -> Self {
        let action = if previous.is_some() {
            HistoryAction::Reassigned
        } else {
            HistoryAction::Assigned
        };
        let mut old = Snapshot::new();
        old.insert("assigned_user_id".into(), previous.map_or(Value::Null, Value::from));
        let mut new = Snapshot::new();
        new.insert("assigned_user_id".into(), Value::from(assignee.user_id.clone()));
        Self::for_complaint(
            complaint,
            action,
            actor,
            format!("Assigned to {}", assignee.full_name()),
            at,
        )
        .with_old(old)
        .with_new(new)
    }

    pub fn comment_added(complaint: &ComplaintRecord, actor: Option<&User>, at: DateTime<Utc>) -> Self {
        let by = actor.map(User::full_name).unwrap_or_else(|| "System".into());
        Self::for_complaint(
            complaint,
            HistoryAction::CommentAdded,
            actor,
            format!("Comment added by {by}"),
            at,
        )
    }

    pub fn attachment_added(
        complaint: &ComplaintRecord,
        actor: Option<&User>,
        filename: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self::for_complaint(
            complaint,
            HistoryAction::AttachmentAdded,
            actor,
            format!("Attachment '{filename}' added"),
            at,
        )
    }

    /// The DELETED entry carries no complaint link, only the reference.
    pub fn deleted(complaint: &ComplaintRecord, actor: Option<&User>, at: DateTime<Utc>) -> Self {
        let mut old = Snapshot::new();
        old.insert("title".into(), Value::from(complaint.title.clone()));
        old.insert("status".into(), Value::from(complaint.status.as_str()));
        let by = actor.map_or("system", |u| u.email.as_str());
        Self::new(
            &complaint.tenant_id,
            None,
            &complaint.reference,
            HistoryAction::Deleted,
            actor,
            format!("Complaint {} deleted by {by}", complaint.reference),
            at,
        )
        .with_old(old)
    }

    pub fn sla_config_removed(
        tenant_id: &str,
        actor: Option<&User>,
        category_name: &str,
        urgency: &str,
        delay_hours: i64,
        at: DateTime<Utc>,
    ) -> Self {
        let mut old = Snapshot::new();
        old.insert("category".into(), Value::from(category_name));
        old.insert("urgency".into(), Value::from(urgency));
        old.insert("delay_hours".into(), Value::from(delay_hours));
        Self::new(
            tenant_id,
            None,
            SLA_CONFIG_REFERENCE,
            HistoryAction::Updated,
            actor,
            format!("SLA Config deleted for {category_name} - {urgency}"),
            at,
        )
        .with_old(old)
    }
}

/// The fields whose change decides the recorded action of an update.
pub fn tracked_snapshot(complaint: &ComplaintRecord) -> Snapshot {
    let mut snap = Snapshot::new();
    snap.insert("status".into(), Value::from(complaint.status.as_str()));
    snap.insert("urgency".into(), Value::from(complaint.urgency.as_str()));
    snap.insert(
        "assigned_user_id".into(),
        complaint.assigned_user.clone().map_or(Value::Null, Value::from),
    );
    snap
}

/// Status change wins over assignment change; anything else is UPDATED.
pub fn classify_update(old: &Snapshot, new: &Snapshot) -> HistoryAction {
    if old.get("status") != new.get("status") {
        return HistoryAction::StatusChanged;
    }
    let old_assignee = old.get("assigned_user_id").filter(|v| !v.is_null());
    let new_assignee = new.get("assigned_user_id").filter(|v| !v.is_null());
    if old_assignee != new_assignee {
        return if old_assignee.is_some() {
            HistoryAction::Reassigned
        } else {
            HistoryAction::Assigned
        };
    }
    HistoryAction::Updated
}

fn snapshot_str<'s>(snap: &'s Snapshot, key: &str) -> &'s str {
    snap.get(key).and_then(Value::as_str).unwrap_or("")
}

pub struct HistoryRecorder<'a> {
    store: &'a DeskStore,
}

impl<'a> HistoryRecorder<'a> {
    pub fn new(store: &'a DeskStore) -> Self {
        Self { store }
    }

    /// Append an entry, propagating store errors.
    fn try_record(&self, entry: &HistoryEntry) -> DeskResult<()> {
        self.store.insert_history(entry)?;
        log::debug!(
            "history: {} {} ({})",
            entry.complaint_reference,
            entry.action,
            entry.description
        );
        Ok(())
    }

    /// Best-effort append. A failure is logged and swallowed.
    pub fn record(&self, entry: HistoryEntry) -> Option<HistoryEntry> {
        match self.try_record(&entry) {
            Ok(()) => Some(entry),
            Err(e) => {
                log::warn!(
                    "history write for {} ({}) failed: {e}",
                    entry.complaint_reference,
                    entry.action
                );
                None
            }
        }
    }

    pub fn for_complaint(&self, complaint_id: &str) -> DeskResult<Vec<HistoryEntry>> {
        self.store.history_for_complaint(complaint_id)
    }

    pub fn for_reference(&self, reference: &str) -> DeskResult<Vec<HistoryEntry>> {
        self.store.history_for_reference(reference)
    }

    /// Most recent entries first. `tenant_id = None` spans all tenants.
    pub fn recent(&self, tenant_id: Option<&str>, limit: usize) -> DeskResult<Vec<HistoryEntry>> {
        self.store.recent_history(tenant_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(status: &str, assignee: Option<&str>) -> Snapshot {
        let mut s = Snapshot::new();
        s.insert("status".into(), Value::from(status));
        s.insert("urgency".into(), Value::from("LOW"));
        s.insert("assigned_user_id".into(), assignee.map_or(Value::Null, Value::from));
        s
    }

    #[test]
    fn status_change_takes_precedence() {
        let action = classify_update(&snap("NEW", None), &snap("ASSIGNED", Some("a")));
        assert_eq!(action, HistoryAction::StatusChanged);
    }

    #[test]
    fn first_assignee_is_assigned_then_reassigned() {
        assert_eq!(
            classify_update(&snap("NEW", None), &snap("NEW", Some("a"))),
            HistoryAction::Assigned
        );
        assert_eq!(
            classify_update(&snap("NEW", Some("a")), &snap("NEW", Some("b"))),
            HistoryAction::Reassigned
        );
    }

    #[test]
    fn untracked_change_is_updated() {
        assert_eq!(
            classify_update(&snap("NEW", Some("a")), &snap("NEW", Some("a"))),
            HistoryAction::Updated
        );
    }

    #[test]
    fn action_names_parse_back() {
        for action in [
            HistoryAction::Created,
            HistoryAction::StatusChanged,
            HistoryAction::Reassigned,
            HistoryAction::Deleted,
        ] {
            assert_eq!(action.as_str().parse::<HistoryAction>().unwrap(), action);
        }
    }
}
