use super::{epoch_col, json_col, to_epoch, DeskStore};
use crate::{error::DeskResult, history::HistoryEntry};
use rusqlite::{params, Connection};

const HISTORY_COLUMNS: &str = "h.history_id, h.tenant_id, h.complaint_id, h.complaint_reference, \
     h.action, h.user_id, h.old_value, h.new_value, h.description, h.created_at";

fn history_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        history_id: row.get(0)?,
        tenant_id: row.get(1)?,
        complaint_id: row.get(2)?,
        complaint_reference: row.get(3)?,
        action: row.get(4)?,
        user_id: row.get(5)?,
        old_value: json_col(row, 6)?,
        new_value: json_col(row, 7)?,
        description: row.get(8)?,
        created_at: epoch_col(row, 9)?,
    })
}

/// Shared by the plain insert and the delete transaction.
pub(super) fn insert_history_on(conn: &Connection, e: &HistoryEntry) -> DeskResult<()> {
    let old_value = e.old_value.as_ref().map(serde_json::to_string).transpose()?;
    let new_value = e.new_value.as_ref().map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO complaint_history (
            history_id, tenant_id, complaint_id, complaint_reference, action, user_id,
            old_value, new_value, description, created_at, seq
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                   (SELECT COALESCE(MAX(seq), 0) + 1 FROM complaint_history))",
        params![
            &e.history_id,
            &e.tenant_id,
            e.complaint_id.as_deref(),
            &e.complaint_reference,
            e.action,
            e.user_id.as_deref(),
            old_value,
            new_value,
            &e.description,
            to_epoch(e.created_at),
        ],
    )?;
    Ok(())
}

impl DeskStore {
    // ── Complaint history ──────────────────────────────────────────

    pub fn insert_history(&self, e: &HistoryEntry) -> DeskResult<()> {
        insert_history_on(&self.conn, e)
    }

    /// Oldest first.
    pub fn history_for_complaint(&self, complaint_id: &str) -> DeskResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM complaint_history h
             WHERE h.complaint_id = ?1 ORDER BY h.created_at ASC, h.seq ASC"
        ))?;
        let rows = stmt.query_map(params![complaint_id], history_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Oldest first. Still answers after the complaint has been deleted.
    pub fn history_for_reference(&self, reference: &str) -> DeskResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS} FROM complaint_history h
             WHERE h.complaint_reference = ?1 ORDER BY h.created_at ASC, h.seq ASC"
        ))?;
        let rows = stmt.query_map(params![reference], history_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Newest first.
    pub fn recent_history(&self, tenant_id: Option<&str>, limit: usize) -> DeskResult<Vec<HistoryEntry>> {
        Ok(self
            .recent_history_with_actor(tenant_id, limit)?
            .into_iter()
            .map(|(entry, _)| entry)
            .collect())
    }

    /// Newest first, each entry paired with the acting user's full name.
    /// The name is None for system actions or users that no longer exist.
    pub fn recent_history_with_actor(
        &self,
        tenant_id: Option<&str>,
        limit: usize,
    ) -> DeskResult<Vec<(HistoryEntry, Option<String>)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HISTORY_COLUMNS}, TRIM(u.first_name || ' ' || u.last_name)
             FROM complaint_history h LEFT JOIN app_user u ON u.user_id = h.user_id
             WHERE (?1 IS NULL OR h.tenant_id = ?1)
             ORDER BY h.created_at DESC, h.seq DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![tenant_id, limit as i64], |row| {
            Ok((history_row_mapper(row)?, row.get::<_, Option<String>>(10)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
