//! Role-scoped dashboard statistics.
//!
//! One `DashboardView` per role. An unrecognised role gets the agent view.
//! Every number in one payload is computed against a single `now`, read
//! from the clock once per request.
//!
//! RULE: views only read. They go through `ComplaintFilter` and the store
//! aggregates; none of them loads whole complaint lists to count in memory.

pub mod agent;
pub mod auditor;
pub mod metrics;
pub mod platform;
pub mod reception;
pub mod tenant_admin;

use crate::{
    clock::Clock,
    config::DeskConfig,
    directory::User,
    error::{DeskError, DeskResult},
    store::{ComplaintFilter, DeskStore},
    types::{Role, Status, Urgency},
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use metrics::{compliance_rate, day_buckets, mean_hours, AvailabilityTier};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// The role string exactly as stored on the user.
    pub role: String,
    pub user: DashboardUser,
    pub stats: DashboardStats,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DashboardStats {
    Platform(platform::PlatformStats),
    TenantAdmin(tenant_admin::TenantAdminStats),
    Reception(reception::ReceptionStats),
    Agent(agent::AgentStats),
    Auditor(auditor::AuditorStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Platform,
    TenantAdmin,
    Reception,
    Agent,
    Auditor,
}

impl DashboardView {
    pub fn for_role(role: &str) -> Self {
        match role.parse::<Role>() {
            Ok(Role::SuperAdmin)  => DashboardView::Platform,
            Ok(Role::TenantAdmin) => DashboardView::TenantAdmin,
            Ok(Role::Reception)   => DashboardView::Reception,
            Ok(Role::Auditor)     => DashboardView::Auditor,
            Ok(Role::Agent) | Err(_) => DashboardView::Agent,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DashboardView::Platform    => "platform",
            DashboardView::TenantAdmin => "tenant_admin",
            DashboardView::Reception   => "reception",
            DashboardView::Agent       => "agent",
            DashboardView::Auditor     => "auditor",
        }
    }
}

// ── Service ──────────────────────────────────────────────────────────────────

pub struct StatisticsService<'a> {
    store: &'a DeskStore,
    clock: &'a dyn Clock,
    config: &'a DeskConfig,
}

impl<'a> StatisticsService<'a> {
    pub fn new(store: &'a DeskStore, clock: &'a dyn Clock, config: &'a DeskConfig) -> Self {
        Self { store, clock, config }
    }

    /// Dashboard for `user`, scoped to the user's own tenant.
    pub fn dashboard(&self, user: &User) -> DeskResult<Dashboard> {
        self.dashboard_in(user, None)
    }

    /// Dashboard for `user`, optionally scoped to another tenant
    /// (a platform admin drilling into one tenant).
    pub fn dashboard_in(&self, user: &User, tenant_id: Option<&str>) -> DeskResult<Dashboard> {
        let started = Instant::now();
        let ctx = StatsContext::new(self.store, self.config, self.clock.now());
        let view = DashboardView::for_role(&user.role);
        let tenant = tenant_id.map(String::from).or_else(|| user.tenant_id.clone());
        let scoped_tenant = || {
            tenant
                .as_deref()
                .ok_or_else(|| DeskError::MissingTenant { user_id: user.user_id.clone() })
        };

        let stats = match view {
            DashboardView::Platform => DashboardStats::Platform(platform::build(&ctx)?),
            DashboardView::TenantAdmin => {
                DashboardStats::TenantAdmin(tenant_admin::build(&ctx, scoped_tenant()?)?)
            }
            DashboardView::Reception => {
                DashboardStats::Reception(reception::build(&ctx, scoped_tenant()?, user)?)
            }
            DashboardView::Agent => DashboardStats::Agent(agent::build(&ctx, scoped_tenant()?, user)?),
            DashboardView::Auditor => {
                DashboardStats::Auditor(auditor::build(&ctx, scoped_tenant()?)?)
            }
        };

        log::debug!(
            "dashboard {} for {} built in {:?}",
            view.name(),
            user.email,
            started.elapsed()
        );
        Ok(Dashboard {
            role: user.role.clone(),
            user: DashboardUser {
                id: user.user_id.clone(),
                name: user.full_name(),
                email: user.email.clone(),
            },
            stats,
            timestamp: ctx.now,
        })
    }
}

// ── Shared context and building blocks ───────────────────────────────────────

/// Everything one dashboard request computes against.
pub struct StatsContext<'a> {
    pub store: &'a DeskStore,
    pub config: &'a DeskConfig,
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaPerformance {
    pub sla_met: i64,
    pub sla_missed: i64,
    pub compliance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    #[serde(rename = "category__name")]
    pub category_name: Option<String>,
    pub count: i64,
}

/// One value per urgency, keyed HIGH / MEDIUM / LOW.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerUrgency<T> {
    #[serde(rename = "HIGH")]
    pub high: T,
    #[serde(rename = "MEDIUM")]
    pub medium: T,
    #[serde(rename = "LOW")]
    pub low: T,
}

impl<T> PerUrgency<T> {
    pub fn try_build(mut f: impl FnMut(Urgency) -> DeskResult<T>) -> DeskResult<Self> {
        Ok(Self {
            high: f(Urgency::High)?,
            medium: f(Urgency::Medium)?,
            low: f(Urgency::Low)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub agent_id: String,
    pub agent_name: String,
    pub active_complaints: i64,
    pub resolved_complaints: i64,
    pub sla_compliance_rate: f64,
    pub avg_resolution_time_hours: Option<f64>,
    pub overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAvailability {
    pub agent_id: String,
    pub agent_name: String,
    pub active_complaints: i64,
    pub status: AvailabilityTier,
}

impl<'a> StatsContext<'a> {
    pub fn new(store: &'a DeskStore, config: &'a DeskConfig, now: DateTime<Utc>) -> Self {
        Self {
            store,
            config,
            now,
            offset: config.local_offset(),
        }
    }

    pub fn count(&self, filter: &ComplaintFilter) -> DeskResult<i64> {
        self.store.count_complaints(filter)
    }

    /// Compliance over the RESOLVED/CLOSED subset of `base`.
    pub fn compliance(&self, base: &ComplaintFilter) -> DeskResult<f64> {
        let perf = self.sla_performance(base)?;
        Ok(perf.compliance_rate)
    }

    pub fn sla_performance(&self, base: &ComplaintFilter) -> DeskResult<SlaPerformance> {
        let resolved = base.clone().with_statuses(&Status::RESOLVED);
        let total = self.store.count_complaints(&resolved)?;
        if total == 0 {
            return Ok(SlaPerformance { sla_met: 0, sla_missed: 0, compliance_rate: 0.0 });
        }
        let met = self.store.count_sla_met(&resolved)?;
        Ok(SlaPerformance {
            sla_met: met,
            sla_missed: total - met,
            compliance_rate: compliance_rate(met, total),
        })
    }

    /// Mean hours to resolution over the RESOLVED/CLOSED subset of `base`.
    pub fn mean_resolution(&self, base: &ComplaintFilter) -> DeskResult<Option<f64>> {
        let hours = self
            .store
            .resolution_hours(&base.clone().with_statuses(&Status::RESOLVED))?;
        Ok(mean_hours(&hours))
    }

    /// Open complaints of `base` within `open` whose deadline has passed.
    pub fn overdue(&self, base: &ComplaintFilter, open: &[Status]) -> DeskResult<i64> {
        self.count(&base.clone().with_statuses(open).deadline_before(self.now))
    }

    pub fn weekly_trend(&self, base: &ComplaintFilter) -> DeskResult<Vec<DayCount>> {
        day_buckets(self.now, self.offset)
            .into_iter()
            .map(|bucket| {
                Ok(DayCount {
                    count: self.count(&bucket.narrow(base.clone()))?,
                    date: bucket.date,
                    day: bucket.day,
                })
            })
            .collect()
    }

    pub fn top_categories(&self, base: &ComplaintFilter, limit: usize) -> DeskResult<Vec<CategoryCount>> {
        Ok(self
            .store
            .count_by_category(base, limit)?
            .into_iter()
            .map(|(category_name, count)| CategoryCount { category_name, count })
            .collect())
    }

    fn assignable_staff(&self, tenant_id: &str) -> DeskResult<Vec<User>> {
        self.store.list_users(tenant_id, &Role::ASSIGNABLE, true)
    }

    /// One row per active agent or tenant admin, busiest first.
    pub fn team_performance(&self, tenant_id: &str) -> DeskResult<Vec<AgentPerformance>> {
        let mut team = Vec::new();
        for agent in self.assignable_staff(tenant_id)? {
            let assigned = ComplaintFilter::tenant(tenant_id).assigned_to(&agent.user_id);
            let sla = self.sla_performance(&assigned)?;
            team.push(AgentPerformance {
                active_complaints: self.count(&assigned.clone().excluding(&Status::TERMINAL))?,
                resolved_complaints: sla.sla_met + sla.sla_missed,
                sla_compliance_rate: sla.compliance_rate,
                avg_resolution_time_hours: self.mean_resolution(&assigned)?,
                overdue: self.overdue(&assigned, &Status::OPEN)?,
                agent_id: agent.user_id.clone(),
                agent_name: agent.full_name(),
            });
        }
        team.sort_by(|a, b| b.active_complaints.cmp(&a.active_complaints));
        Ok(team)
    }

    /// Workload over working statuses, least loaded first.
    pub fn agents_availability(&self, tenant_id: &str) -> DeskResult<Vec<AgentAvailability>> {
        let mut out = Vec::new();
        for agent in self.assignable_staff(tenant_id)? {
            let active = self.count(
                &ComplaintFilter::tenant(tenant_id)
                    .assigned_to(&agent.user_id)
                    .with_statuses(&Status::WORKING),
            )?;
            out.push(AgentAvailability {
                agent_id: agent.user_id.clone(),
                agent_name: agent.full_name(),
                active_complaints: active,
                status: AvailabilityTier::from_active_count(active),
            });
        }
        out.sort_by_key(|a| a.active_complaints);
        Ok(out)
    }

    pub fn days_ago(&self, days: i64) -> DateTime<Utc> {
        self.now - Duration::days(days)
    }
}
