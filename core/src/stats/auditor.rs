//! Compliance and audit view of one tenant.

use super::{metrics::ResolutionSummary, AgentPerformance, SlaPerformance, StatsContext};
use crate::{
    error::DeskResult,
    history::HistoryAction,
    store::ComplaintFilter,
    types::{Status, Urgency},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditorStats {
    pub compliance_indicators: ComplianceIndicators,
    pub quality_analysis: QualityAnalysis,
    pub audit_trail: Vec<AuditTrailItem>,
    pub sla_performance: SlaPerformance,
    pub agent_performance: Vec<AgentPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceIndicators {
    pub sla_compliance_rate: f64,
    pub overdue_complaints: i64,
    pub unassigned_complaints: i64,
    /// Being worked but without a single comment.
    pub complaints_without_activity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    pub resolution_time_distribution: ResolutionSummary,
    /// Not tracked yet: no status transition out of RESOLVED is recorded.
    pub reopened_complaints: i64,
    pub critical_complaints: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailItem {
    pub id: String,
    pub complaint_reference: String,
    pub action: HistoryAction,
    pub user: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

pub fn build(ctx: &StatsContext<'_>, tenant_id: &str) -> DeskResult<AuditorStats> {
    let base = ComplaintFilter::tenant(tenant_id);

    let compliance_indicators = ComplianceIndicators {
        sla_compliance_rate: ctx.compliance(&base)?,
        overdue_complaints: ctx.overdue(&base, &Status::OPEN_NARROW)?,
        unassigned_complaints: ctx.count(&base.clone().unassigned())?,
        complaints_without_activity: ctx.store.count_without_comments(
            &base.clone().with_statuses(&[Status::Assigned, Status::InProgress]),
        )?,
    };

    let hours = ctx
        .store
        .resolution_hours(&base.clone().with_statuses(&Status::RESOLVED))?;
    let quality_analysis = QualityAnalysis {
        resolution_time_distribution: ResolutionSummary::from_hours(&hours),
        reopened_complaints: 0,
        critical_complaints: ctx.count(
            &base
                .clone()
                .with_urgency(Urgency::High)
                .with_statuses(&[Status::New, Status::Received, Status::Assigned]),
        )?,
    };

    let audit_trail = ctx
        .store
        .recent_history_with_actor(Some(tenant_id), ctx.config.limits.audit_trail)?
        .into_iter()
        .map(|(entry, actor)| AuditTrailItem {
            id: entry.history_id,
            complaint_reference: entry.complaint_reference,
            action: entry.action,
            user: actor
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "System".to_string()),
            description: entry.description,
            timestamp: entry.created_at,
        })
        .collect();

    Ok(AuditorStats {
        compliance_indicators,
        quality_analysis,
        audit_trail,
        sla_performance: ctx.sla_performance(&base)?,
        agent_performance: ctx.team_performance(tenant_id)?,
    })
}
