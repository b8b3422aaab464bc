//! Shared primitive types and enumerations used across the crate.
//!
//! Enumerations are persisted and serialized as their SCREAMING_SNAKE_CASE
//! names, which are the strings the surrounding application already uses.

use crate::error::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stable identifier for a tenant, user, complaint, category or history row.
pub type EntityId = String;
pub type TenantId = String;
pub type UserId = String;
pub type ComplaintId = String;
pub type CategoryId = String;

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    New,
    Received,
    Assigned,
    InProgress,
    Investigation,
    Action,
    Resolved,
    Archived,
    Closed,
}

impl Status {
    pub const ALL: [Status; 9] = [
        Status::New,
        Status::Received,
        Status::Assigned,
        Status::InProgress,
        Status::Investigation,
        Status::Action,
        Status::Resolved,
        Status::Archived,
        Status::Closed,
    ];

    /// Statuses that stamp `closed_at` and count as resolved for SLA purposes.
    pub const RESOLVED: [Status; 2] = [Status::Resolved, Status::Closed];

    /// Statuses that end the active life of a complaint.
    pub const TERMINAL: [Status; 3] = [Status::Resolved, Status::Closed, Status::Archived];

    /// Not yet picked up by anyone.
    pub const TO_HANDLE: [Status; 2] = [Status::New, Status::Received];

    /// Assigned and being worked.
    pub const WORKING: [Status; 4] = [
        Status::Assigned,
        Status::InProgress,
        Status::Investigation,
        Status::Action,
    ];

    /// Six-state open set used by tenant overviews, agent views and team tables.
    pub const OPEN: [Status; 6] = [
        Status::New,
        Status::Received,
        Status::Assigned,
        Status::InProgress,
        Status::Investigation,
        Status::Action,
    ];

    /// Narrow open set used by platform rollups, auditor compliance and the
    /// expiring-soon alert. INVESTIGATION and ACTION are not part of it.
    pub const OPEN_NARROW: [Status; 4] = [
        Status::New,
        Status::Received,
        Status::Assigned,
        Status::InProgress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New           => "NEW",
            Status::Received      => "RECEIVED",
            Status::Assigned      => "ASSIGNED",
            Status::InProgress    => "IN_PROGRESS",
            Status::Investigation => "INVESTIGATION",
            Status::Action        => "ACTION",
            Status::Resolved      => "RESOLVED",
            Status::Archived      => "ARCHIVED",
            Status::Closed        => "CLOSED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }

    pub fn is_resolved(&self) -> bool {
        Self::RESOLVED.contains(self)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DeskError::UnknownStatus { value: s.to_string() })
    }
}

// ── Urgency ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Presentation order used by distributions: most urgent first.
    pub const ALL: [Urgency; 3] = [Urgency::High, Urgency::Medium, Urgency::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low    => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High   => "HIGH",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        match s {
            "LOW"    => Ok(Urgency::Low),
            "MEDIUM" => Ok(Urgency::Medium),
            "HIGH"   => Ok(Urgency::High),
            other    => Err(DeskError::UnknownUrgency { value: other.to_string() }),
        }
    }
}

// ── Role ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    TenantAdmin,
    Reception,
    Agent,
    Auditor,
}

impl Role {
    /// Roles that may hold complaint assignments.
    pub const ASSIGNABLE: [Role; 2] = [Role::Agent, Role::TenantAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin  => "SUPER_ADMIN",
            Role::TenantAdmin => "TENANT_ADMIN",
            Role::Reception   => "RECEPTION",
            Role::Agent       => "AGENT",
            Role::Auditor     => "AUDITOR",
        }
    }

    pub fn is_assignable(&self) -> bool {
        Self::ASSIGNABLE.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        match s {
            "SUPER_ADMIN"  => Ok(Role::SuperAdmin),
            "TENANT_ADMIN" => Ok(Role::TenantAdmin),
            "RECEPTION"    => Ok(Role::Reception),
            "AGENT"        => Ok(Role::Agent),
            "AUDITOR"      => Ok(Role::Auditor),
            other          => Err(DeskError::UnknownRole { value: other.to_string() }),
        }
    }
}
