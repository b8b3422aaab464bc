//! Full view of one tenant for its administrators.

use super::{
    metrics::{percentage, start_of_local_day, week_over_week, TrendDirection},
    AgentPerformance, CategoryCount, DayCount, PerUrgency, Severity, SlaPerformance, StatsContext,
};
use crate::{
    error::DeskResult,
    store::ComplaintFilter,
    types::{Status, Urgency},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantAdminStats {
    pub overview: TenantOverview,
    pub team_performance: Vec<AgentPerformance>,
    pub trends: TenantTrends,
    pub alerts: Vec<TenantAlert>,
    pub sla_performance: SlaPerformance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantOverview {
    pub total_complaints: i64,
    pub today: i64,
    pub this_week: i64,
    pub prev_week: i64,
    pub trend: TrendDirection,
    pub trend_percentage: f64,
    pub urgent_unhandled: i64,
    pub unassigned: i64,
    pub overdue: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountShare {
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub to_handle: i64,
    pub in_progress: i64,
    pub closed: i64,
    pub archived: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantTrends {
    pub weekly: Vec<DayCount>,
    pub urgency_distribution: PerUrgency<CountShare>,
    pub status_distribution: StatusDistribution,
    pub category_stats: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantAlertKind {
    UrgentUnhandled,
    SlaExpiringSoon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantAlert {
    #[serde(rename = "type")]
    pub kind: TenantAlertKind,
    pub severity: Severity,
    pub count: i64,
    pub message: String,
}

pub fn build(ctx: &StatsContext<'_>, tenant_id: &str) -> DeskResult<TenantAdminStats> {
    let base = ComplaintFilter::tenant(tenant_id);
    Ok(TenantAdminStats {
        overview: overview(ctx, &base)?,
        team_performance: ctx.team_performance(tenant_id)?,
        trends: trends(ctx, &base)?,
        alerts: alerts(ctx, &base)?,
        sla_performance: ctx.sla_performance(&base)?,
    })
}

fn urgent_unhandled(base: &ComplaintFilter) -> ComplaintFilter {
    base.clone()
        .with_urgency(Urgency::High)
        .with_statuses(&Status::TO_HANDLE)
}

fn overview(ctx: &StatsContext<'_>, base: &ComplaintFilter) -> DeskResult<TenantOverview> {
    let today = start_of_local_day(ctx.now, ctx.offset);
    let week_start = ctx.days_ago(7);
    let this_week = ctx.count(&base.clone().submitted_since(week_start))?;
    let prev_week = ctx.count(&base.clone().submitted_between(ctx.days_ago(14), week_start))?;
    let (trend, trend_percentage) = week_over_week(this_week, prev_week);

    Ok(TenantOverview {
        total_complaints: ctx.count(base)?,
        today: ctx.count(&base.clone().submitted_between(today, today + Duration::days(1)))?,
        this_week,
        prev_week,
        trend,
        trend_percentage,
        urgent_unhandled: ctx.count(&urgent_unhandled(base))?,
        unassigned: ctx.count(&base.clone().unassigned())?,
        overdue: ctx.overdue(base, &Status::OPEN)?,
    })
}

fn trends(ctx: &StatsContext<'_>, base: &ComplaintFilter) -> DeskResult<TenantTrends> {
    let total = ctx.count(base)?;
    let urgency_distribution = PerUrgency::try_build(|urgency| {
        let count = ctx.count(&base.clone().with_urgency(urgency))?;
        Ok(CountShare { count, percentage: percentage(count, total) })
    })?;

    let status_distribution = StatusDistribution {
        to_handle: ctx.count(&base.clone().with_statuses(&Status::TO_HANDLE))?,
        in_progress: ctx.count(&base.clone().with_statuses(&Status::WORKING))?,
        closed: ctx.count(&base.clone().with_statuses(&[Status::Closed]))?,
        archived: ctx.count(&base.clone().with_statuses(&[Status::Archived]))?,
    };

    Ok(TenantTrends {
        weekly: ctx.weekly_trend(base)?,
        urgency_distribution,
        status_distribution,
        category_stats: ctx.top_categories(base, ctx.config.limits.top_categories)?,
    })
}

fn alerts(ctx: &StatsContext<'_>, base: &ComplaintFilter) -> DeskResult<Vec<TenantAlert>> {
    let mut alerts = Vec::new();

    let urgent = ctx.count(&urgent_unhandled(base))?;
    if urgent > 0 {
        alerts.push(TenantAlert {
            kind: TenantAlertKind::UrgentUnhandled,
            severity: Severity::High,
            count: urgent,
            message: format!("{urgent} urgent complaint(s) need immediate attention"),
        });
    }

    let window = ctx.config.alerts.expiring_soon_hours;
    let expiring = ctx.count(
        &base
            .clone()
            .with_statuses(&Status::OPEN_NARROW)
            .deadline_after(ctx.now)
            .deadline_before(ctx.now + Duration::hours(window)),
    )?;
    if expiring > 0 {
        alerts.push(TenantAlert {
            kind: TenantAlertKind::SlaExpiringSoon,
            severity: Severity::Medium,
            count: expiring,
            message: format!("{expiring} complaint(s) will breach SLA in less than {window} hours"),
        });
    }

    Ok(alerts)
}
