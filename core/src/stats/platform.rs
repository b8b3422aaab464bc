//! Platform-wide rollup for super admins: every active tenant.

use super::{metrics::month_buckets, Severity, StatsContext};
use crate::{
    error::DeskResult,
    store::ComplaintFilter,
    types::Status,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub platform_overview: PlatformOverview,
    pub tenant_stats: Vec<TenantRollup>,
    pub monthly_volume: Vec<MonthCount>,
    pub alerts: Vec<PlatformAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformOverview {
    pub total_tenants: i64,
    pub total_complaints: i64,
    pub total_active_complaints: i64,
    pub global_sla_compliance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRollup {
    pub tenant_id: String,
    pub tenant_name: String,
    /// The tenant code; kept under this key for existing consumers.
    pub schema_name: String,
    pub total_complaints: i64,
    pub active_complaints: i64,
    pub sla_compliance_rate: f64,
    pub overdue: i64,
    pub is_premium: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformAlertKind {
    LowSla,
    ManyOverdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAlert {
    #[serde(rename = "type")]
    pub kind: PlatformAlertKind,
    pub severity: Severity,
    pub tenant: String,
    pub message: String,
}

pub fn build(ctx: &StatsContext<'_>) -> DeskResult<PlatformStats> {
    let all = ComplaintFilter::all();
    let tenants = ctx.store.list_active_tenants()?;

    let mut rollups = Vec::with_capacity(tenants.len());
    for tenant in &tenants {
        let scoped = ComplaintFilter::tenant(&tenant.tenant_id);
        rollups.push(TenantRollup {
            tenant_id: tenant.tenant_id.clone(),
            tenant_name: tenant.name.clone(),
            schema_name: tenant.code.clone(),
            total_complaints: ctx.count(&scoped)?,
            active_complaints: ctx.count(&scoped.clone().excluding(&Status::TERMINAL))?,
            sla_compliance_rate: ctx.compliance(&scoped)?,
            overdue: ctx.overdue(&scoped, &Status::OPEN_NARROW)?,
            is_premium: tenant.is_premium,
        });
    }
    rollups.sort_by(|a, b| b.total_complaints.cmp(&a.total_complaints));

    let alerts = platform_alerts(ctx, &rollups);
    rollups.truncate(ctx.config.limits.top_tenants);

    let monthly_volume = month_buckets(ctx.now, ctx.offset)
        .into_iter()
        .map(|bucket| {
            Ok(MonthCount {
                count: ctx.count(&bucket.narrow(all.clone()))?,
                month: bucket.month,
            })
        })
        .collect::<DeskResult<Vec<_>>>()?;

    Ok(PlatformStats {
        platform_overview: PlatformOverview {
            total_tenants: ctx.store.count_active_tenants()?,
            total_complaints: ctx.count(&all)?,
            total_active_complaints: ctx.count(&all.clone().excluding(&Status::TERMINAL))?,
            global_sla_compliance: ctx.compliance(&all)?,
        },
        tenant_stats: rollups,
        monthly_volume,
        alerts,
    })
}

/// Alerts over every tenant, not just the ones listed, capped by config.
fn platform_alerts(ctx: &StatsContext<'_>, rollups: &[TenantRollup]) -> Vec<PlatformAlert> {
    let thresholds = &ctx.config.alerts;
    let mut alerts = Vec::new();
    for t in rollups {
        if t.sla_compliance_rate < thresholds.min_sla_compliance_pct {
            alerts.push(PlatformAlert {
                kind: PlatformAlertKind::LowSla,
                severity: Severity::High,
                tenant: t.tenant_name.clone(),
                message: format!(
                    "SLA compliance is {:.1}% (below {}%)",
                    t.sla_compliance_rate, thresholds.min_sla_compliance_pct
                ),
            });
        }
        if t.overdue > thresholds.max_overdue_per_tenant {
            alerts.push(PlatformAlert {
                kind: PlatformAlertKind::ManyOverdue,
                severity: Severity::Medium,
                tenant: t.tenant_name.clone(),
                message: format!("{} complaints are overdue", t.overdue),
            });
        }
    }
    alerts.truncate(ctx.config.limits.platform_alerts);
    alerts
}
