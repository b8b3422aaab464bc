//! Tenants, categories and the user/role directory.
//!
//! These are plain records; the statistics aggregator and the lifecycle
//! service only read them.

use crate::types::{CategoryId, EntityId, Role, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub tenant_id: TenantId,
    /// Short uppercase code used as the complaint reference prefix.
    pub code: String,
    pub name: String,
    pub zone: String,
    pub is_active: bool,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub category_id: CategoryId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubCategory {
    pub subcategory_id: EntityId,
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: UserId,
    /// None for platform-level accounts.
    pub tenant_id: Option<TenantId>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Raw role string as stored. Kept unparsed so that an unmapped role
    /// can still reach the dashboard and take the agent fallback.
    pub role: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// The parsed role, if it is one of the known identifiers.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn can_be_assigned_in(&self, tenant_id: &str) -> bool {
        self.tenant_id.as_deref() == Some(tenant_id)
            && self.role().is_some_and(|r| r.is_assignable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, tenant: Option<&str>) -> User {
        User {
            user_id: "u-1".into(),
            tenant_id: tenant.map(String::from),
            email: "a@b.c".into(),
            first_name: "Ada".into(),
            last_name: String::new(),
            role: role.into(),
            is_active: true,
            date_joined: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn full_name_trims_missing_parts() {
        assert_eq!(user("AGENT", None).full_name(), "Ada");
    }

    #[test]
    fn only_agents_and_tenant_admins_of_the_tenant_are_assignable() {
        assert!(user("AGENT", Some("t1")).can_be_assigned_in("t1"));
        assert!(user("TENANT_ADMIN", Some("t1")).can_be_assigned_in("t1"));
        assert!(!user("AGENT", Some("t2")).can_be_assigned_in("t1"));
        assert!(!user("RECEPTION", Some("t1")).can_be_assigned_in("t1"));
        assert!(!user("JANITOR", Some("t1")).can_be_assigned_in("t1"));
    }
}
