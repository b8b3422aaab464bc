//! Triage view: intake today, the unassigned queue and who can take work.

use super::{
    metrics::{local_date, round1, start_of_local_day, start_of_local_month},
    AgentAvailability, CategoryCount, PerUrgency, StatsContext,
};
use crate::{
    directory::User,
    error::DeskResult,
    store::{ComplaintFilter, ComplaintOrder},
    types::{ComplaintId, Urgency},
};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceptionStats {
    pub today_stats: TodayStats,
    pub assignment_queue: AssignmentQueue,
    pub personal_performance: IntakePerformance,
    pub quick_actions: ReceptionQuickActions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    pub total_received: i64,
    pub created_by_me: i64,
    pub pending_assignment: i64,
    pub urgent_unassigned: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentQueue {
    pub unassigned_by_urgency: PerUrgency<i64>,
    pub agents_availability: Vec<AgentAvailability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakePerformance {
    pub total_created_this_month: i64,
    pub average_per_day: f64,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedComplaint {
    pub id: ComplaintId,
    pub reference: String,
    pub title: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceptionQuickActions {
    pub urgent_to_assign: Vec<QueuedComplaint>,
}

pub fn build(ctx: &StatsContext<'_>, tenant_id: &str, user: &User) -> DeskResult<ReceptionStats> {
    let base = ComplaintFilter::tenant(tenant_id);
    let day_start = start_of_local_day(ctx.now, ctx.offset);
    let today = |f: ComplaintFilter| f.submitted_between(day_start, day_start + Duration::days(1));
    let mine = base.clone().submitted_by(&user.user_id);
    let unassigned = base.clone().unassigned();
    let urgent_unassigned = unassigned.clone().with_urgency(Urgency::High);

    let month_start = start_of_local_month(ctx.now, ctx.offset);
    let mine_this_month = mine.clone().submitted_since(month_start);
    let created_this_month = ctx.count(&mine_this_month)?;
    let day_of_month = local_date(ctx.now, ctx.offset).day().max(1);

    let urgent_to_assign = ctx
        .store
        .list_complaints(
            &urgent_unassigned,
            ComplaintOrder::SubmittedAsc,
            Some(ctx.config.limits.quick_actions),
        )?
        .into_iter()
        .map(|c| QueuedComplaint {
            id: c.complaint_id,
            reference: c.reference,
            title: c.title,
            submitted_at: c.submitted_at,
        })
        .collect();

    Ok(ReceptionStats {
        today_stats: TodayStats {
            total_received: ctx.count(&today(base.clone()))?,
            created_by_me: ctx.count(&today(mine))?,
            pending_assignment: ctx.count(&unassigned)?,
            urgent_unassigned: ctx.count(&urgent_unassigned)?,
        },
        assignment_queue: AssignmentQueue {
            unassigned_by_urgency: PerUrgency::try_build(|urgency| {
                ctx.count(&unassigned.clone().with_urgency(urgency))
            })?,
            agents_availability: ctx.agents_availability(tenant_id)?,
        },
        personal_performance: IntakePerformance {
            total_created_this_month: created_this_month,
            average_per_day: round1(created_this_month as f64 / day_of_month as f64),
            by_category: ctx.top_categories(&mine_this_month, ctx.config.limits.top_categories)?,
        },
        quick_actions: ReceptionQuickActions { urgent_to_assign },
    })
}
