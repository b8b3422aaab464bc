//! Shared fixture for the integration tests: a migrated in-memory store,
//! a pinned clock and the default configuration.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use complaintdesk_core::{
    clock::FixedClock,
    complaint::{ComplaintRecord, NewComplaint},
    config::DeskConfig,
    directory::{Category, Tenant, User},
    service::ComplaintService,
    stats::StatisticsService,
    store::DeskStore,
    types::Urgency,
};

/// Monday 2025-03-03 09:00 UTC.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

pub struct Desk {
    pub store: DeskStore,
    pub clock: FixedClock,
    pub config: DeskConfig,
}

impl Desk {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = DeskStore::in_memory().unwrap();
        store.migrate().unwrap();
        Self {
            store,
            clock: FixedClock::new(t0()),
            config: DeskConfig::default(),
        }
    }

    pub fn service(&self) -> ComplaintService<'_> {
        ComplaintService::new(&self.store, &self.clock, &self.config)
    }

    pub fn stats(&self) -> StatisticsService<'_> {
        StatisticsService::new(&self.store, &self.clock, &self.config)
    }

    pub fn tenant(&self, tenant_id: &str, code: &str) -> Tenant {
        let tenant = Tenant {
            tenant_id: tenant_id.into(),
            code: code.into(),
            name: format!("{code} council"),
            zone: "Central".into(),
            is_active: true,
            is_premium: false,
            created_at: t0(),
        };
        self.store.insert_tenant(&tenant).unwrap();
        tenant
    }

    pub fn category(&self, tenant_id: &str, category_id: &str, name: &str) -> Category {
        let category = Category {
            category_id: category_id.into(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            description: String::new(),
            created_at: t0(),
        };
        self.store.insert_category(&category).unwrap();
        category
    }

    pub fn user(&self, user_id: &str, tenant_id: Option<&str>, role: &str) -> User {
        let user = User {
            user_id: user_id.into(),
            tenant_id: tenant_id.map(String::from),
            email: format!("{user_id}@desk.test"),
            first_name: user_id.to_uppercase(),
            last_name: "Tester".into(),
            role: role.into(),
            is_active: true,
            date_joined: t0(),
        };
        self.store.insert_user(&user).unwrap();
        user
    }

    /// Register a complaint at the clock's current time.
    pub fn complaint(
        &self,
        tenant_id: &str,
        actor: Option<&User>,
        category_id: Option<&str>,
        urgency: Urgency,
    ) -> ComplaintRecord {
        self.service()
            .create(
                tenant_id,
                actor,
                NewComplaint {
                    title: "Street light out".into(),
                    description: "Dark since Friday".into(),
                    urgency,
                    category_id: category_id.map(String::from),
                    ..NewComplaint::default()
                },
            )
            .unwrap()
            .record
    }
}
