use super::{epoch_col, to_epoch, DeskStore};
use crate::{
    error::{DeskError, DeskResult},
    sla::SlaConfig,
    types::Urgency,
};
use rusqlite::{params, OptionalExtension};

fn sla_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<SlaConfig> {
    Ok(SlaConfig {
        sla_config_id: row.get(0)?,
        tenant_id: row.get(1)?,
        category_id: row.get(2)?,
        urgency_level: row.get(3)?,
        delay_hours: row.get(4)?,
        created_at: epoch_col(row, 5)?,
        updated_at: epoch_col(row, 6)?,
    })
}

impl DeskStore {
    // ── SLA config ─────────────────────────────────────────────────

    /// Insert, or replace the delay of the existing row for the same
    /// (tenant, category, urgency) key.
    pub fn upsert_sla_config(&self, c: &SlaConfig) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO sla_config (
                sla_config_id, tenant_id, category_id, urgency_level, delay_hours,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (tenant_id, category_id, urgency_level)
             DO UPDATE SET delay_hours = excluded.delay_hours, updated_at = excluded.updated_at",
            params![
                &c.sla_config_id,
                &c.tenant_id,
                &c.category_id,
                c.urgency_level,
                c.delay_hours,
                to_epoch(c.created_at),
                to_epoch(c.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Exact-key lookup. None means no policy row; callers fall back to defaults.
    pub fn find_sla_delay(
        &self,
        tenant_id: &str,
        category_id: &str,
        urgency: Urgency,
    ) -> DeskResult<Option<i64>> {
        self.conn
            .query_row(
                "SELECT delay_hours FROM sla_config
                 WHERE tenant_id = ?1 AND category_id = ?2 AND urgency_level = ?3",
                params![tenant_id, category_id, urgency],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_sla_config(&self, sla_config_id: &str) -> DeskResult<SlaConfig> {
        self.conn
            .query_row(
                "SELECT sla_config_id, tenant_id, category_id, urgency_level, delay_hours,
                        created_at, updated_at
                 FROM sla_config WHERE sla_config_id = ?1",
                params![sla_config_id],
                sla_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::SlaConfigNotFound { id: sla_config_id.to_string() })
    }

    pub fn list_sla_configs(&self, tenant_id: &str) -> DeskResult<Vec<SlaConfig>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.sla_config_id, s.tenant_id, s.category_id, s.urgency_level, s.delay_hours,
                    s.created_at, s.updated_at
             FROM sla_config s JOIN category cat ON cat.category_id = s.category_id
             WHERE s.tenant_id = ?1
             ORDER BY cat.name ASC, s.urgency_level ASC",
        )?;
        let rows = stmt.query_map(params![tenant_id], sla_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_sla_config(&self, sla_config_id: &str) -> DeskResult<()> {
        let n = self.conn.execute(
            "DELETE FROM sla_config WHERE sla_config_id = ?1",
            params![sla_config_id],
        )?;
        if n == 0 {
            return Err(DeskError::SlaConfigNotFound { id: sla_config_id.to_string() });
        }
        Ok(())
    }
}
