//! SLA policy resolution and deadline calculation.
//!
//! A delay is looked up by exact (tenant, category, urgency) match in the
//! `sla_config` table. On a miss the static per-urgency table from
//! `DeskConfig::default_sla_hours` applies. Urgency names outside
//! LOW/MEDIUM/HIGH are a configuration error and fail fast.

use crate::{
    complaint::ComplaintRecord,
    config::DefaultSlaHours,
    error::{DeskError, DeskResult},
    store::DeskStore,
    types::{CategoryId, EntityId, TenantId, Urgency},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlaConfig {
    pub sla_config_id: EntityId,
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub urgency_level: Urgency,
    pub delay_hours: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlaConfig {
    pub fn new(
        tenant_id: &str,
        category_id: &str,
        urgency_level: Urgency,
        delay_hours: i64,
        at: DateTime<Utc>,
    ) -> DeskResult<Self> {
        if delay_hours <= 0 {
            return Err(DeskError::InvalidSlaDelay { hours: delay_hours });
        }
        Ok(Self {
            sla_config_id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            category_id: category_id.to_string(),
            urgency_level,
            delay_hours,
            created_at: at,
            updated_at: at,
        })
    }
}

pub struct SlaPolicyResolver<'a> {
    store: &'a DeskStore,
    defaults: &'a DefaultSlaHours,
}

impl<'a> SlaPolicyResolver<'a> {
    pub fn new(store: &'a DeskStore, defaults: &'a DefaultSlaHours) -> Self {
        Self { store, defaults }
    }

    /// Allowed response time in hours for the given key.
    pub fn resolve_delay_hours(
        &self,
        tenant_id: &str,
        category_id: Option<&str>,
        urgency: Urgency,
    ) -> DeskResult<i64> {
        if let Some(category_id) = category_id {
            if let Some(hours) = self.store.find_sla_delay(tenant_id, category_id, urgency)? {
                return Ok(hours);
            }
        }
        Ok(self.defaults.for_urgency(urgency))
    }

    /// Same as `resolve_delay_hours` for an urgency given by name.
    pub fn resolve_delay_hours_named(
        &self,
        tenant_id: &str,
        category_id: Option<&str>,
        urgency: &str,
    ) -> DeskResult<i64> {
        let urgency: Urgency = urgency.parse()?;
        self.resolve_delay_hours(tenant_id, category_id, urgency)
    }
}

pub fn compute_deadline(submitted_at: DateTime<Utc>, delay_hours: i64) -> DateTime<Utc> {
    submitted_at + Duration::hours(delay_hours)
}

/// Run on every save. Returns true when a deadline was assigned.
///
/// No-op when a deadline is already set. Skipped without error when
/// `submitted_at` is not yet stamped or the complaint has no category;
/// a complaint without a category never receives a deadline here.
pub fn apply_sla_deadline(
    resolver: &SlaPolicyResolver<'_>,
    complaint: &mut ComplaintRecord,
) -> DeskResult<bool> {
    if complaint.sla_deadline.is_some() {
        return Ok(false);
    }
    let Some(submitted_at) = complaint.submitted_at else {
        return Ok(false);
    };
    let Some(category_id) = complaint.category_id.as_deref() else {
        return Ok(false);
    };

    let hours = resolver.resolve_delay_hours(&complaint.tenant_id, Some(category_id), complaint.urgency)?;
    let deadline = compute_deadline(submitted_at, hours);
    complaint.sla_deadline = Some(deadline);
    log::debug!(
        "sla: complaint {} ({}) deadline {} (+{hours}h)",
        complaint.complaint_id,
        complaint.urgency,
        deadline.to_rfc3339()
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deadline_is_submission_plus_delay() {
        let t = Utc.with_ymd_and_hms(2025, 1, 31, 22, 0, 0).unwrap();
        assert_eq!(
            compute_deadline(t, 24),
            Utc.with_ymd_and_hms(2025, 2, 1, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn non_positive_delay_is_rejected() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            SlaConfig::new("t", "c", Urgency::High, 0, t),
            Err(DeskError::InvalidSlaDelay { hours: 0 })
        ));
    }
}
