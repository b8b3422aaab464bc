//! Demo data seeding.
//!
//! Builds a small multi-tenant desk (tenants, categories, staff of every
//! role, SLA rows) and then drives complaints through the real lifecycle
//! service, moving a `FixedClock` so that every timestamp, deadline and
//! history row is the one production code would have written.
//!
//! RULE: same plan, same seed, same desk. Only generated UUIDs differ
//! between runs; references, titles, statuses and timestamps do not.

use crate::{
    clock::{Clock, FixedClock},
    complaint::{CommentKind, NewComplaint},
    config::DeskConfig,
    directory::{Category, SubCategory, Tenant, User},
    error::DeskResult,
    name_generator::{NameGenerator, DEMO_CATEGORIES},
    rng::{DemoRng, DemoStream},
    service::ComplaintService,
    store::DeskStore,
    types::{Role, Status, Urgency},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// User id of the seeded platform administrator.
pub const PLATFORM_ADMIN_ID: &str = "platform-admin";

const AGENTS_PER_TENANT: usize = 3;

/// (code, name, zone, premium)
const DEMO_TENANTS: &[(&str, &str, &str, bool)] = &[
    ("NBC", "Northbridge Council", "North", true),
    ("RSD", "Riverside District", "East", false),
    ("HCB", "Hillcrest Borough", "South", false),
];

#[derive(Debug, Clone)]
pub struct DemoPlan {
    pub seed: u64,
    pub complaints_per_tenant: usize,
    /// How far back submissions are spread from the clock's current time.
    pub history_days: i64,
}

impl Default for DemoPlan {
    fn default() -> Self {
        Self {
            seed: 42,
            complaints_per_tenant: 40,
            history_days: 75,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemoSummary {
    pub tenants: usize,
    pub users: usize,
    pub complaints: usize,
    pub assigned: usize,
    pub resolved: usize,
    pub comments: usize,
}

/// Staff of one seeded tenant.
struct TenantStaff {
    tenant: Tenant,
    categories: Vec<Category>,
    admin: User,
    reception: User,
    agents: Vec<User>,
}

/// Seed `store` according to `plan`. The clock is returned to its starting
/// instant before this returns.
pub fn seed_demo(
    store: &DeskStore,
    clock: &FixedClock,
    config: &DeskConfig,
    plan: &DemoPlan,
) -> DeskResult<DemoSummary> {
    let anchor = clock.now();
    let mut summary = DemoSummary::default();
    let mut directory_rng = DemoRng::new(plan.seed, DemoStream::Directory);

    let earliest = anchor - Duration::days(plan.history_days + 1);
    let admin = demo_user(PLATFORM_ADMIN_ID, None, Role::SuperAdmin, "Platform", "Admin", earliest);
    store.insert_user(&admin)?;
    summary.users += 1;

    let mut staff = Vec::with_capacity(DEMO_TENANTS.len());
    for (code, name, zone, premium) in DEMO_TENANTS {
        let seeded = seed_tenant(store, clock, config, &mut directory_rng, code, name, zone, *premium, earliest)?;
        summary.tenants += 1;
        summary.users += 3 + seeded.agents.len();
        staff.push(seeded);
    }

    let result = seed_complaints(store, clock, config, plan, anchor, &staff, &mut summary);
    clock.set(anchor);
    result?;

    log::info!(
        "demo seeded: {} tenants, {} users, {} complaints ({} resolved)",
        summary.tenants,
        summary.users,
        summary.complaints,
        summary.resolved
    );
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn seed_tenant(
    store: &DeskStore,
    clock: &FixedClock,
    config: &DeskConfig,
    rng: &mut DemoRng,
    code: &str,
    name: &str,
    zone: &str,
    is_premium: bool,
    at: DateTime<Utc>,
) -> DeskResult<TenantStaff> {
    let tenant = Tenant {
        tenant_id: format!("tenant-{}", code.to_lowercase()),
        code: code.to_string(),
        name: name.to_string(),
        zone: zone.to_string(),
        is_active: true,
        is_premium,
        created_at: at,
    };
    store.insert_tenant(&tenant)?;

    let mut categories = Vec::with_capacity(DEMO_CATEGORIES.len());
    for category_name in DEMO_CATEGORIES {
        let category = Category {
            category_id: format!("{}-{}", tenant.tenant_id, category_name.to_lowercase()),
            tenant_id: tenant.tenant_id.clone(),
            name: category_name.to_string(),
            description: format!("{category_name} related complaints"),
            created_at: at,
        };
        store.insert_category(&category)?;
        store.insert_subcategory(&SubCategory {
            subcategory_id: format!("{}-general", category.category_id),
            tenant_id: tenant.tenant_id.clone(),
            category_id: category.category_id.clone(),
            name: "General".to_string(),
            description: String::new(),
            created_at: at,
        })?;
        categories.push(category);
    }

    // Tight policies on the first two categories; the rest use the defaults.
    clock.set(at);
    let service = ComplaintService::new(store, clock, config);
    for category in categories.iter().take(2) {
        service.set_sla_config(&tenant.tenant_id, &category.category_id, Urgency::High, 8)?;
        service.set_sla_config(&tenant.tenant_id, &category.category_id, Urgency::Medium, 24)?;
    }

    let mut person = |suffix: &str, role: Role| -> DeskResult<User> {
        let user = demo_user(
            &format!("{}-{suffix}", tenant.tenant_id),
            Some(&tenant.tenant_id),
            role,
            NameGenerator::first_name(rng),
            NameGenerator::last_name(rng),
            at,
        );
        store.insert_user(&user)?;
        Ok(user)
    };

    let admin = person("admin", Role::TenantAdmin)?;
    let reception = person("reception", Role::Reception)?;
    person("auditor", Role::Auditor)?;
    let agents = (1..=AGENTS_PER_TENANT)
        .map(|n| person(&format!("agent-{n}"), Role::Agent))
        .collect::<DeskResult<Vec<_>>>()?;

    Ok(TenantStaff { tenant, categories, admin, reception, agents })
}

fn demo_user(
    user_id: &str,
    tenant_id: Option<&str>,
    role: Role,
    first_name: &str,
    last_name: &str,
    at: DateTime<Utc>,
) -> User {
    let domain = tenant_id.unwrap_or("platform");
    User {
        user_id: user_id.to_string(),
        tenant_id: tenant_id.map(String::from),
        email: format!("{user_id}@{domain}.example"),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role: role.as_str().to_string(),
        is_active: true,
        date_joined: at,
    }
}

// ── Complaint traffic ────────────────────────────────────────────────────────

/// One planned complaint, drawn up front so that lifecycle steps can be
/// replayed in submission order.
struct PlannedComplaint {
    staff_index: usize,
    submitted_at: DateTime<Utc>,
    category_index: usize,
    urgency: Urgency,
}

fn seed_complaints(
    store: &DeskStore,
    clock: &FixedClock,
    config: &DeskConfig,
    plan: &DemoPlan,
    anchor: DateTime<Utc>,
    staff: &[TenantStaff],
    summary: &mut DemoSummary,
) -> DeskResult<()> {
    let mut intake = DemoRng::new(plan.seed, DemoStream::Intake);
    let mut lifecycle = DemoRng::new(plan.seed, DemoStream::Lifecycle);
    let window_minutes = plan.history_days.max(1) * 24 * 60;

    let mut planned = Vec::with_capacity(staff.len() * plan.complaints_per_tenant);
    for staff_index in 0..staff.len() {
        for _ in 0..plan.complaints_per_tenant {
            let urgency = Urgency::ALL[intake.weighted(&[0.2, 0.5, 0.3])];
            planned.push(PlannedComplaint {
                staff_index,
                submitted_at: anchor - Duration::minutes(intake.between(30, window_minutes)),
                category_index: intake.below(DEMO_CATEGORIES.len() as u64) as usize,
                urgency,
            });
        }
    }
    planned.sort_by_key(|p| (p.submitted_at, p.staff_index));

    let service = ComplaintService::new(store, clock, config);
    for p in planned {
        let team = &staff[p.staff_index];
        let category = &team.categories[p.category_index % team.categories.len()];

        clock.set(p.submitted_at);
        let created = service.create(
            &team.tenant.tenant_id,
            Some(&team.reception),
            NewComplaint {
                title: NameGenerator::complaint_title(&mut intake, &category.name),
                description: format!("Reported by phone to {}", team.tenant.name),
                urgency: p.urgency,
                location: NameGenerator::location(&mut intake),
                phone_number: NameGenerator::phone_number(&mut intake),
                category_id: Some(category.category_id.clone()),
                subcategory_id: None,
            },
        )?;
        summary.complaints += 1;
        let complaint_id = created.record.complaint_id;

        // Untouched complaints stay NEW and feed the reception queue.
        if !lifecycle.chance(0.8) {
            continue;
        }
        let Some(agent) = lifecycle.pick(&team.agents) else { continue };
        let mut at = p.submitted_at + Duration::minutes(lifecycle.between(20, 6 * 60));
        if at >= anchor {
            continue;
        }
        clock.set(at);
        service.assign(&complaint_id, Some(&team.admin), &agent.user_id)?;
        summary.assigned += 1;

        at += Duration::minutes(lifecycle.between(10, 12 * 60));
        if at >= anchor {
            continue;
        }
        clock.set(at);
        service.change_status(&complaint_id, Some(agent), Status::InProgress)?;

        if lifecycle.chance(0.5) {
            at += Duration::minutes(lifecycle.between(5, 3 * 60));
            if at >= anchor {
                continue;
            }
            clock.set(at);
            service.add_comment(&complaint_id, Some(agent), CommentKind::Internal, "Crew dispatched to site")?;
            summary.comments += 1;
        }

        if !lifecycle.chance(0.75) {
            continue;
        }
        // Skewed resolution times so some land inside the SLA and some miss it.
        at += Duration::minutes(lifecycle.between(30, 96 * 60) / lifecycle.between(1, 3));
        if at >= anchor {
            continue;
        }
        clock.set(at);
        service.change_status(&complaint_id, Some(agent), Status::Resolved)?;
        summary.resolved += 1;

        if lifecycle.chance(0.3) {
            at += Duration::hours(lifecycle.between(1, 48));
            if at < anchor {
                clock.set(at);
                service.change_status(&complaint_id, Some(&team.admin), Status::Closed)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ComplaintFilter, ComplaintOrder};
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 16, 0, 0).unwrap()
    }

    fn store() -> DeskStore {
        let store = DeskStore::in_memory().unwrap();
        store.migrate().unwrap();
        store
    }

    fn small_plan(seed: u64) -> DemoPlan {
        DemoPlan { seed, complaints_per_tenant: 12, history_days: 30 }
    }

    #[test]
    fn seeding_restores_the_clock_and_counts_everything() {
        let store = store();
        let clock = FixedClock::new(anchor());
        let config = DeskConfig::default();

        let summary = seed_demo(&store, &clock, &config, &small_plan(5)).unwrap();

        assert_eq!(clock.now(), anchor());
        assert_eq!(summary.tenants, DEMO_TENANTS.len());
        assert_eq!(summary.users, 1 + DEMO_TENANTS.len() * (3 + AGENTS_PER_TENANT));
        assert_eq!(summary.complaints, DEMO_TENANTS.len() * 12);
        assert_eq!(store.count_complaints(&ComplaintFilter::all()).unwrap(), summary.complaints as i64);
        assert!(summary.resolved <= summary.assigned);
    }

    #[test]
    fn every_seeded_complaint_gets_a_deadline() {
        let store = store();
        let clock = FixedClock::new(anchor());
        seed_demo(&store, &clock, &DeskConfig::default(), &small_plan(9)).unwrap();

        let all = store
            .list_complaints(&ComplaintFilter::all(), ComplaintOrder::SubmittedAsc, None)
            .unwrap();
        assert!(all.iter().all(|c| c.sla_deadline.is_some()));
        assert!(all.iter().all(|c| c.submitted_at.is_some_and(|s| s < anchor())));
    }
}
