//! `ComplaintFilter`: the one query shape every complaint aggregate uses.
//!
//! Status and urgency constraints are string set-membership, so a name
//! that is not a known status or urgency simply matches nothing.

use super::to_epoch;
use crate::types::{CategoryId, Status, TenantId, Urgency, UserId};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AssigneeFilter {
    #[default]
    Any,
    Unassigned,
    Assigned,
    User(UserId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComplaintOrder {
    #[default]
    SubmittedDesc,
    SubmittedAsc,
    /// Soonest deadline first; complaints without one go last.
    DeadlineAsc,
}

impl ComplaintOrder {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            ComplaintOrder::SubmittedDesc => "c.submitted_at DESC, c.reference DESC",
            ComplaintOrder::SubmittedAsc  => "c.submitted_at ASC, c.reference ASC",
            ComplaintOrder::DeadlineAsc   => "c.sla_deadline IS NULL, c.sla_deadline ASC, c.reference ASC",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintFilter {
    pub tenant_id: Option<TenantId>,
    pub statuses: Option<Vec<String>>,
    pub excluded_statuses: Vec<String>,
    pub urgency: Option<String>,
    pub assignee: AssigneeFilter,
    pub submitted_by: Option<UserId>,
    pub category_id: Option<CategoryId>,
    /// Inclusive lower bound on `submitted_at`.
    pub submitted_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `submitted_at`.
    pub submitted_before: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `submitted_at`.
    pub submitted_until: Option<DateTime<Utc>>,
    pub closed_from: Option<DateTime<Utc>>,
    /// Strict: `sla_deadline < x`.
    pub deadline_before: Option<DateTime<Utc>>,
    /// Strict: `sla_deadline > x`.
    pub deadline_after: Option<DateTime<Utc>>,
    pub has_deadline: bool,
}

impl ComplaintFilter {
    /// Every complaint of one tenant.
    pub fn tenant(tenant_id: &str) -> Self {
        Self {
            tenant_id: Some(tenant_id.to_string()),
            ..Self::default()
        }
    }

    /// Every complaint on the platform.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: &[Status]) -> Self {
        let names: Vec<&str> = statuses.iter().map(Status::as_str).collect();
        self.with_status_names(&names)
    }

    pub fn with_status_names(mut self, names: &[&str]) -> Self {
        self.statuses = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn excluding(mut self, statuses: &[Status]) -> Self {
        self.excluded_statuses
            .extend(statuses.iter().map(|s| s.as_str().to_string()));
        self
    }

    pub fn with_urgency(self, urgency: Urgency) -> Self {
        self.with_urgency_name(urgency.as_str())
    }

    pub fn with_urgency_name(mut self, name: &str) -> Self {
        self.urgency = Some(name.to_string());
        self
    }

    pub fn assigned_to(mut self, user_id: &str) -> Self {
        self.assignee = AssigneeFilter::User(user_id.to_string());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.assignee = AssigneeFilter::Unassigned;
        self
    }

    pub fn assigned(mut self) -> Self {
        self.assignee = AssigneeFilter::Assigned;
        self
    }

    pub fn submitted_by(mut self, user_id: &str) -> Self {
        self.submitted_by = Some(user_id.to_string());
        self
    }

    pub fn in_category(mut self, category_id: &str) -> Self {
        self.category_id = Some(category_id.to_string());
        self
    }

    /// Half-open window `[from, before)`.
    pub fn submitted_between(mut self, from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.submitted_from = Some(from);
        self.submitted_before = Some(before);
        self
    }

    pub fn submitted_since(mut self, from: DateTime<Utc>) -> Self {
        self.submitted_from = Some(from);
        self
    }

    pub fn submitted_until(mut self, until: DateTime<Utc>) -> Self {
        self.submitted_until = Some(until);
        self
    }

    pub fn closed_since(mut self, from: DateTime<Utc>) -> Self {
        self.closed_from = Some(from);
        self
    }

    pub fn deadline_before(mut self, at: DateTime<Utc>) -> Self {
        self.deadline_before = Some(at);
        self
    }

    pub fn deadline_after(mut self, at: DateTime<Utc>) -> Self {
        self.deadline_after = Some(at);
        self
    }

    pub fn with_deadline(mut self) -> Self {
        self.has_deadline = true;
        self
    }

    /// Render as a WHERE body over the alias `c` with anonymous `?` params.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(tenant_id) = &self.tenant_id {
            clauses.push("c.tenant_id = ?".into());
            params.push(Value::Text(tenant_id.clone()));
        }
        if let Some(statuses) = &self.statuses {
            if statuses.is_empty() {
                clauses.push("0".into());
            } else {
                clauses.push(format!("c.status IN ({})", placeholders(statuses.len())));
                params.extend(statuses.iter().cloned().map(Value::Text));
            }
        }
        if !self.excluded_statuses.is_empty() {
            clauses.push(format!(
                "c.status NOT IN ({})",
                placeholders(self.excluded_statuses.len())
            ));
            params.extend(self.excluded_statuses.iter().cloned().map(Value::Text));
        }
        if let Some(urgency) = &self.urgency {
            clauses.push("c.urgency = ?".into());
            params.push(Value::Text(urgency.clone()));
        }
        match &self.assignee {
            AssigneeFilter::Any => {}
            AssigneeFilter::Unassigned => clauses.push("c.assigned_user IS NULL".into()),
            AssigneeFilter::Assigned => clauses.push("c.assigned_user IS NOT NULL".into()),
            AssigneeFilter::User(user_id) => {
                clauses.push("c.assigned_user = ?".into());
                params.push(Value::Text(user_id.clone()));
            }
        }
        if let Some(user_id) = &self.submitted_by {
            clauses.push("c.submitted_by = ?".into());
            params.push(Value::Text(user_id.clone()));
        }
        if let Some(category_id) = &self.category_id {
            clauses.push("c.category_id = ?".into());
            params.push(Value::Text(category_id.clone()));
        }

        let bounds = [
            ("c.submitted_at >= ?", self.submitted_from),
            ("c.submitted_at < ?", self.submitted_before),
            ("c.submitted_at <= ?", self.submitted_until),
            ("c.closed_at >= ?", self.closed_from),
            ("c.sla_deadline < ?", self.deadline_before),
            ("c.sla_deadline > ?", self.deadline_after),
        ];
        for (clause, bound) in bounds {
            if let Some(at) = bound {
                clauses.push(clause.into());
                params.push(Value::Integer(to_epoch(at)));
            }
        }
        if self.has_deadline {
            clauses.push("c.sla_deadline IS NOT NULL".into());
        }

        if clauses.is_empty() {
            ("1".into(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
