//! Self-scoped view for agents: only complaints assigned to the caller.
//! Also the fallback for roles the dashboard does not recognise.

use super::{DayCount, StatsContext};
use crate::{
    complaint::ComplaintRecord,
    directory::User,
    error::DeskResult,
    store::{ComplaintFilter, ComplaintOrder},
    types::{ComplaintId, Status, Urgency},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub my_complaints: MyComplaints,
    pub personal_performance: PersonalPerformance,
    pub workload_by_status: BTreeMap<String, i64>,
    pub upcoming_deadlines: Vec<DeadlineItem>,
    pub weekly_trend: Vec<DayCount>,
    pub quick_actions: AgentQuickActions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyComplaints {
    pub active: i64,
    pub urgent: i64,
    pub overdue: i64,
    pub resolved_this_week: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalPerformance {
    pub avg_resolution_time_hours: Option<f64>,
    pub sla_compliance_rate: f64,
    pub total_resolved: i64,
    pub comparison_with_team: TeamComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamComparison {
    pub team_avg_time: Option<f64>,
    pub team_sla_compliance_rate: f64,
    /// None when either side has no resolved complaints.
    pub better_than_average: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineItem {
    pub id: ComplaintId,
    pub reference: String,
    pub title: String,
    pub sla_deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

impl DeadlineItem {
    fn from_record(c: ComplaintRecord, with_urgency: bool) -> Self {
        Self {
            urgency: with_urgency.then_some(c.urgency),
            id: c.complaint_id,
            reference: c.reference,
            title: c.title,
            sla_deadline: c.sla_deadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentQuickActions {
    pub urgent_tasks: Vec<DeadlineItem>,
    pub overdue_tasks: Vec<DeadlineItem>,
}

pub fn build(ctx: &StatsContext<'_>, tenant_id: &str, user: &User) -> DeskResult<AgentStats> {
    let team = ComplaintFilter::tenant(tenant_id);
    let mine = team.clone().assigned_to(&user.user_id);
    let active = mine.clone().with_statuses(&Status::OPEN);
    let urgent = active.clone().with_urgency(Urgency::High);
    let overdue = active.clone().deadline_before(ctx.now);
    let limits = &ctx.config.limits;

    let list = |filter: &ComplaintFilter, limit: usize, with_urgency: bool| -> DeskResult<Vec<DeadlineItem>> {
        Ok(ctx
            .store
            .list_complaints(filter, ComplaintOrder::DeadlineAsc, Some(limit))?
            .into_iter()
            .map(|c| DeadlineItem::from_record(c, with_urgency))
            .collect())
    };

    let my_sla = ctx.sla_performance(&mine)?;
    let my_avg = ctx.mean_resolution(&mine)?;
    let team_avg = ctx.mean_resolution(&team)?;
    let better_than_average = match (my_avg, team_avg) {
        (Some(own), Some(team_avg)) => Some(own < team_avg),
        _ => None,
    };

    Ok(AgentStats {
        my_complaints: MyComplaints {
            active: ctx.count(&active)?,
            urgent: ctx.count(&urgent)?,
            overdue: ctx.count(&overdue)?,
            resolved_this_week: ctx.count(
                &mine
                    .clone()
                    .with_statuses(&Status::RESOLVED)
                    .closed_since(ctx.days_ago(7)),
            )?,
        },
        personal_performance: PersonalPerformance {
            avg_resolution_time_hours: my_avg,
            sla_compliance_rate: my_sla.compliance_rate,
            total_resolved: my_sla.sla_met + my_sla.sla_missed,
            comparison_with_team: TeamComparison {
                team_avg_time: team_avg,
                team_sla_compliance_rate: ctx.compliance(&team)?,
                better_than_average,
            },
        },
        workload_by_status: ctx.store.count_by_status(&active)?.into_iter().collect(),
        upcoming_deadlines: list(&active.clone().with_deadline(), limits.upcoming_deadlines, true)?,
        weekly_trend: ctx.weekly_trend(&mine)?,
        quick_actions: AgentQuickActions {
            urgent_tasks: list(&urgent, limits.quick_actions, false)?,
            overdue_tasks: list(&overdue, limits.quick_actions, false)?,
        },
    })
}
