//! Complaint lifecycle service.
//!
//! Every mutation follows the same order: compute the new record, persist
//! it, append history (best-effort), then fan out notifications for the
//! returned events.
//!
//! RULE: `submitted_at`, `closed_at` and `sla_deadline` are each written
//! at most once. Nothing here clears them.

use crate::{
    clock::Clock,
    complaint::{Attachment, Comment, CommentKind, ComplaintPatch, ComplaintRecord, NewComplaint},
    config::DeskConfig,
    directory::User,
    error::{DeskError, DeskResult},
    event::DeskEvent,
    history::{tracked_snapshot, HistoryEntry, HistoryRecorder},
    notify::Notifier,
    sla::{apply_sla_deadline, SlaConfig, SlaPolicyResolver},
    store::{ComplaintFilter, ComplaintOrder, DeskStore},
    types::{Role, Status, Urgency},
};
use chrono::{DateTime, Utc};

/// The result of a lifecycle operation and the events it emitted.
#[derive(Debug, Clone)]
pub struct LifecycleOutcome<T = ComplaintRecord> {
    pub record: T,
    pub events: Vec<DeskEvent>,
}

pub struct ComplaintService<'a> {
    store: &'a DeskStore,
    clock: &'a dyn Clock,
    config: &'a DeskConfig,
}

impl<'a> ComplaintService<'a> {
    pub fn new(store: &'a DeskStore, clock: &'a dyn Clock, config: &'a DeskConfig) -> Self {
        Self { store, clock, config }
    }

    fn resolver(&self) -> SlaPolicyResolver<'a> {
        let config: &'a DeskConfig = self.config;
        SlaPolicyResolver::new(self.store, &config.default_sla_hours)
    }

    fn recorder(&self) -> HistoryRecorder<'a> {
        HistoryRecorder::new(self.store)
    }

    fn finish<T>(&self, record: T, events: Vec<DeskEvent>) -> LifecycleOutcome<T> {
        Notifier::new(self.store, self.clock).fan_out(&events);
        LifecycleOutcome { record, events }
    }

    // ── Create ─────────────────────────────────────────────────────

    pub fn create(
        &self,
        tenant_id: &str,
        actor: Option<&User>,
        input: NewComplaint,
    ) -> DeskResult<LifecycleOutcome> {
        let tenant = self.store.get_tenant(tenant_id)?;
        let now = self.clock.now();
        let mut complaint = ComplaintRecord {
            complaint_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant.tenant_id.clone(),
            reference: String::new(),
            title: input.title,
            description: input.description,
            status: Status::New,
            urgency: input.urgency,
            location: input.location,
            phone_number: input.phone_number,
            category_id: input.category_id,
            subcategory_id: input.subcategory_id,
            submitted_by: actor.map(|u| u.user_id.clone()),
            assigned_user: None,
            submitted_at: Some(now),
            closed_at: None,
            sla_deadline: None,
            updated_at: now,
        };
        apply_sla_deadline(&self.resolver(), &mut complaint)?;
        self.store.insert_new_complaint(&mut complaint, &tenant.code)?;
        self.recorder()
            .record(HistoryEntry::created(&complaint, actor, now));

        log::info!(
            "complaint {} created in {} ({}, deadline {:?})",
            complaint.reference,
            tenant.code,
            complaint.urgency,
            complaint.sla_deadline.map(|d| d.to_rfc3339())
        );
        let events = vec![DeskEvent::ComplaintCreated {
            tenant_id: complaint.tenant_id.clone(),
            complaint_id: complaint.complaint_id.clone(),
            reference: complaint.reference.clone(),
            urgency: complaint.urgency,
            sla_deadline: complaint.sla_deadline,
        }];
        Ok(self.finish(complaint, events))
    }

    // ── Update ─────────────────────────────────────────────────────

    /// Apply a partial update. A patch that changes nothing writes nothing.
    pub fn update(
        &self,
        complaint_id: &str,
        actor: Option<&User>,
        patch: &ComplaintPatch,
    ) -> DeskResult<LifecycleOutcome> {
        let current = self.store.get_complaint(complaint_id)?;
        let mut next = current.clone();
        if !patch.apply_to(&mut next) {
            return Ok(LifecycleOutcome { record: current, events: Vec::new() });
        }

        let assignee = match (&next.assigned_user, &current.assigned_user) {
            (Some(new_id), old) if Some(new_id) != old.as_ref() => {
                Some(self.assignable_user(new_id, &next.tenant_id)?)
            }
            _ => None,
        };

        let now = self.clock.now();
        self.save(&mut next, now)?;

        let entry = HistoryEntry::updated(
            &next,
            actor,
            tracked_snapshot(&current),
            tracked_snapshot(&next),
            assignee.as_ref().map(User::full_name).as_deref(),
            now,
        );
        log::info!("complaint {} {}", next.reference, entry.description);
        self.recorder().record(entry);

        let mut events = Vec::new();
        if current.status != next.status {
            events.push(DeskEvent::StatusChanged {
                tenant_id: next.tenant_id.clone(),
                complaint_id: next.complaint_id.clone(),
                reference: next.reference.clone(),
                from: current.status,
                to: next.status,
            });
        }
        if let Some(assignee) = &assignee {
            events.push(assigned_event(&next, assignee, current.assigned_user.clone()));
        }
        if events.is_empty() {
            events.push(DeskEvent::ComplaintUpdated {
                tenant_id: next.tenant_id.clone(),
                complaint_id: next.complaint_id.clone(),
                reference: next.reference.clone(),
            });
        }
        events.extend(overdue_event(&next, now));
        Ok(self.finish(next, events))
    }

    /// Shorthand for a status-only update.
    pub fn change_status(
        &self,
        complaint_id: &str,
        actor: Option<&User>,
        status: Status,
    ) -> DeskResult<LifecycleOutcome> {
        self.update(complaint_id, actor, &ComplaintPatch::status(status))
    }

    // ── Assign ─────────────────────────────────────────────────────

    /// Assign to an agent or tenant admin of the complaint's tenant and
    /// move the complaint to ASSIGNED.
    pub fn assign(
        &self,
        complaint_id: &str,
        actor: Option<&User>,
        assignee_id: &str,
    ) -> DeskResult<LifecycleOutcome> {
        let current = self.store.get_complaint(complaint_id)?;
        let assignee = self.assignable_user(assignee_id, &current.tenant_id)?;
        let previous = current.assigned_user.clone();

        let mut next = current.clone();
        next.assigned_user = Some(assignee.user_id.clone());
        next.status = Status::Assigned;
        let now = self.clock.now();
        self.save(&mut next, now)?;

        let entry = HistoryEntry::assignment(&next, actor, previous.as_deref(), &assignee, now);
        log::info!("complaint {} {} ({})", next.reference, entry.description, entry.action);
        self.recorder().record(entry);

        let mut events = vec![assigned_event(&next, &assignee, previous)];
        events.extend(overdue_event(&next, now));
        Ok(self.finish(next, events))
    }

    // ── Comments and attachments ───────────────────────────────────

    pub fn add_comment(
        &self,
        complaint_id: &str,
        actor: Option<&User>,
        kind: CommentKind,
        note: &str,
    ) -> DeskResult<LifecycleOutcome<Comment>> {
        let complaint = self.store.get_complaint(complaint_id)?;
        let now = self.clock.now();
        let comment = Comment {
            comment_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: complaint.tenant_id.clone(),
            complaint_id: complaint.complaint_id.clone(),
            user_id: actor.map(|u| u.user_id.clone()),
            kind,
            note: note.to_string(),
            created_at: now,
        };
        self.store.insert_comment(&comment)?;
        self.recorder()
            .record(HistoryEntry::comment_added(&complaint, actor, now));

        let events = vec![DeskEvent::CommentAdded {
            tenant_id: complaint.tenant_id.clone(),
            complaint_id: complaint.complaint_id.clone(),
            reference: complaint.reference.clone(),
            comment_id: comment.comment_id.clone(),
            author_id: comment.user_id.clone(),
            author_name: actor.map(User::full_name).unwrap_or_else(|| "System".into()),
            assignee_id: complaint.assigned_user.clone(),
            submitted_by: complaint.submitted_by.clone(),
        }];
        Ok(self.finish(comment, events))
    }

    /// Record an uploaded file. Only the stored path is kept.
    pub fn add_attachment(
        &self,
        complaint_id: &str,
        actor: Option<&User>,
        filename: &str,
        stored_path: &str,
    ) -> DeskResult<LifecycleOutcome<Attachment>> {
        let complaint = self.store.get_complaint(complaint_id)?;
        let now = self.clock.now();
        let attachment = Attachment {
            attachment_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: complaint.tenant_id.clone(),
            complaint_id: complaint.complaint_id.clone(),
            filename: filename.to_string(),
            stored_path: stored_path.to_string(),
            uploaded_by: actor.map(|u| u.user_id.clone()),
            uploaded_at: now,
        };
        self.store.insert_attachment(&attachment)?;
        self.recorder()
            .record(HistoryEntry::attachment_added(&complaint, actor, filename, now));

        let events = vec![DeskEvent::AttachmentAdded {
            tenant_id: complaint.tenant_id.clone(),
            complaint_id: complaint.complaint_id.clone(),
            reference: complaint.reference.clone(),
            filename: filename.to_string(),
        }];
        Ok(self.finish(attachment, events))
    }

    // ── Delete ─────────────────────────────────────────────────────

    /// Delete a complaint. The DELETED history entry is written in the same
    /// transaction, so unlike other history appends it cannot be lost.
    pub fn delete(&self, complaint_id: &str, actor: Option<&User>) -> DeskResult<LifecycleOutcome<HistoryEntry>> {
        let complaint = self.store.get_complaint(complaint_id)?;
        let entry = HistoryEntry::deleted(&complaint, actor, self.clock.now());
        self.store.delete_complaint_with_history(complaint_id, &entry)?;
        log::info!("{}", entry.description);

        let events = vec![DeskEvent::ComplaintDeleted {
            tenant_id: complaint.tenant_id,
            reference: complaint.reference,
        }];
        Ok(self.finish(entry, events))
    }

    // ── History ────────────────────────────────────────────────────

    pub fn history(&self, complaint_id: &str) -> DeskResult<Vec<HistoryEntry>> {
        self.recorder().for_complaint(complaint_id)
    }

    pub fn tenant_history(&self, tenant_id: &str, limit: usize) -> DeskResult<Vec<HistoryEntry>> {
        self.recorder().recent(Some(tenant_id), limit)
    }

    // ── SLA policy rows ────────────────────────────────────────────

    pub fn set_sla_config(
        &self,
        tenant_id: &str,
        category_id: &str,
        urgency: Urgency,
        delay_hours: i64,
    ) -> DeskResult<SlaConfig> {
        let config = SlaConfig::new(tenant_id, category_id, urgency, delay_hours, self.clock.now())?;
        self.store.upsert_sla_config(&config)?;
        log::info!("sla config {tenant_id}/{category_id}/{urgency} set to {delay_hours}h");
        Ok(config)
    }

    /// Delete a policy row, leaving an UPDATED entry under `SLA_CONFIG`.
    /// The entry is best-effort: the removal stands even if it is not stored.
    pub fn remove_sla_config(&self, sla_config_id: &str, actor: Option<&User>) -> DeskResult<HistoryEntry> {
        let config = self.store.get_sla_config(sla_config_id)?;
        let category_name = self
            .store
            .get_category(&config.category_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| config.category_id.clone());
        self.store.delete_sla_config(sla_config_id)?;

        let entry = HistoryEntry::sla_config_removed(
            &config.tenant_id,
            actor,
            &category_name,
            config.urgency_level.as_str(),
            config.delay_hours,
            self.clock.now(),
        );
        log::info!("{}", entry.description);
        self.recorder().record(entry.clone());
        Ok(entry)
    }

    // ── Visibility ─────────────────────────────────────────────────

    /// Complaints `viewer` may see, narrowed by `filter`.
    ///
    /// Platform admins see every tenant, agents only what is assigned to
    /// them, every other role its own tenant.
    pub fn visible_complaints(
        &self,
        viewer: &User,
        filter: ComplaintFilter,
        limit: Option<usize>,
    ) -> DeskResult<Vec<ComplaintRecord>> {
        let filter = match viewer.role() {
            Some(Role::SuperAdmin) => filter,
            role => {
                let tenant_id = viewer
                    .tenant_id
                    .clone()
                    .ok_or_else(|| DeskError::MissingTenant { user_id: viewer.user_id.clone() })?;
                let scoped = ComplaintFilter { tenant_id: Some(tenant_id), ..filter };
                if role == Some(Role::Agent) {
                    scoped.assigned_to(&viewer.user_id)
                } else {
                    scoped
                }
            }
        };
        self.store
            .list_complaints(&filter, ComplaintOrder::SubmittedDesc, limit)
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn assignable_user(&self, user_id: &str, tenant_id: &str) -> DeskResult<User> {
        let user = self.store.get_user(user_id)?;
        if !user.is_active || !user.can_be_assigned_in(tenant_id) {
            return Err(DeskError::InvalidAssignee {
                user_id: user_id.to_string(),
                tenant_id: tenant_id.to_string(),
            });
        }
        Ok(user)
    }

    /// Stamp the once-only timestamps and persist.
    fn save(&self, complaint: &mut ComplaintRecord, now: DateTime<Utc>) -> DeskResult<()> {
        if complaint.status.is_resolved() && complaint.closed_at.is_none() {
            complaint.closed_at = Some(now);
        }
        apply_sla_deadline(&self.resolver(), complaint)?;
        complaint.updated_at = now;
        self.store.update_complaint(complaint)
    }
}

fn assigned_event(complaint: &ComplaintRecord, assignee: &User, previous: Option<String>) -> DeskEvent {
    DeskEvent::ComplaintAssigned {
        tenant_id: complaint.tenant_id.clone(),
        complaint_id: complaint.complaint_id.clone(),
        reference: complaint.reference.clone(),
        title: complaint.title.clone(),
        assignee_id: assignee.user_id.clone(),
        previous_assignee_id: previous,
    }
}

fn overdue_event(complaint: &ComplaintRecord, now: DateTime<Utc>) -> Option<DeskEvent> {
    let deadline = complaint.sla_deadline?;
    complaint.is_overdue(now).then(|| DeskEvent::SlaOverdue {
        tenant_id: complaint.tenant_id.clone(),
        complaint_id: complaint.complaint_id.clone(),
        reference: complaint.reference.clone(),
        assignee_id: complaint.assigned_user.clone(),
        sla_deadline: deadline,
    })
}
