//! Desk configuration: SLA fallback table, alert thresholds, list limits
//! and the local time offset used for day/month boundaries.
//!
//! Loaded from `<data_dir>/desk_config.json`. Every field has a default,
//! so a partial file only overrides what it names.

use crate::types::Urgency;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultSlaHours {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

impl Default for DefaultSlaHours {
    fn default() -> Self {
        Self {
            low: 72,
            medium: 48,
            high: 24,
        }
    }
}

impl DefaultSlaHours {
    pub fn for_urgency(&self, urgency: Urgency) -> i64 {
        match urgency {
            Urgency::Low    => self.low,
            Urgency::Medium => self.medium,
            Urgency::High   => self.high,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertThresholds {
    /// Platform alert `low_sla` fires below this compliance percentage.
    pub min_sla_compliance_pct: f64,
    /// Platform alert `many_overdue` fires above this overdue count.
    pub max_overdue_per_tenant: i64,
    /// Tenant alert `sla_expiring_soon` looks this many hours ahead.
    pub expiring_soon_hours: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_sla_compliance_pct: 70.0,
            max_overdue_per_tenant: 5,
            expiring_soon_hours: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListLimits {
    pub quick_actions: usize,
    pub upcoming_deadlines: usize,
    pub top_categories: usize,
    pub top_tenants: usize,
    pub platform_alerts: usize,
    pub audit_trail: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            quick_actions: 5,
            upcoming_deadlines: 5,
            top_categories: 5,
            top_tenants: 10,
            platform_alerts: 10,
            audit_trail: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DeskConfig {
    pub default_sla_hours: DefaultSlaHours,
    pub alerts: AlertThresholds,
    pub limits: ListLimits,
    /// Offset from UTC, in minutes, of the timezone whose midnight bounds
    /// "today", the weekly trend and the monthly volume.
    pub utc_offset_minutes: i32,
}

impl DeskConfig {
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/desk_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `data_dir`, falling back to defaults when the file is absent.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/desk_config.json");
        if !std::path::Path::new(&path).exists() {
            log::debug!("{path} not found, using built-in desk configuration");
            return Ok(Self::default());
        }
        Self::load(data_dir)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let table = &self.default_sla_hours;
        if table.low <= 0 || table.medium <= 0 || table.high <= 0 {
            anyhow::bail!("default_sla_hours entries must be positive: {table:?}");
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            anyhow::bail!("utc_offset_minutes out of range: {}", self.utc_offset_minutes);
        }
        Ok(())
    }

    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_fallback_table() {
        let config = DeskConfig::default();
        assert_eq!(config.default_sla_hours.for_urgency(Urgency::Low), 72);
        assert_eq!(config.default_sla_hours.for_urgency(Urgency::Medium), 48);
        assert_eq!(config.default_sla_hours.for_urgency(Urgency::High), 24);
        assert_eq!(config.alerts.min_sla_compliance_pct, 70.0);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: DeskConfig =
            serde_json::from_str(r#"{ "default_sla_hours": { "high": 8 } }"#).unwrap();
        assert_eq!(config.default_sla_hours.high, 8);
        assert_eq!(config.default_sla_hours.low, 72);
        assert_eq!(config.limits.audit_trail, 20);
    }

    #[test]
    fn non_positive_default_delay_is_rejected() {
        let mut config = DeskConfig::default();
        config.default_sla_hours.medium = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_the_data_dir_file() {
        let dir = std::env::temp_dir().join(format!("desk-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let data_dir = dir.to_str().unwrap();

        let fallback = DeskConfig::load_or_default(data_dir).unwrap();
        assert_eq!(fallback, DeskConfig::default());
        assert!(DeskConfig::load(data_dir).is_err());

        std::fs::write(dir.join("desk_config.json"), r#"{ "utc_offset_minutes": 60 }"#).unwrap();
        let loaded = DeskConfig::load_or_default(data_dir).unwrap();
        assert_eq!(loaded.utc_offset_minutes, 60);
        assert_eq!(loaded.local_offset().local_minus_utc(), 3600);

        std::fs::write(dir.join("desk_config.json"), "not json").unwrap();
        assert!(DeskConfig::load_or_default(data_dir).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
