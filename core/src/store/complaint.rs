use super::{
    epoch_col, history::insert_history_on, opt_epoch, opt_epoch_col, to_epoch, ComplaintFilter,
    ComplaintOrder, DeskStore,
};
use crate::{
    complaint::{Attachment, Comment, CommentKind, ComplaintRecord},
    error::{DeskError, DeskResult},
    history::HistoryEntry,
};
use chrono::Datelike;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension};

const COMPLAINT_COLUMNS: &str = "c.complaint_id, c.tenant_id, c.reference, c.title, c.description, \
     c.status, c.urgency, c.location, c.phone_number, c.category_id, c.subcategory_id, \
     c.submitted_by, c.assigned_user, c.submitted_at, c.closed_at, c.sla_deadline, c.updated_at";

fn complaint_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ComplaintRecord> {
    Ok(ComplaintRecord {
        complaint_id: row.get(0)?,
        tenant_id: row.get(1)?,
        reference: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: row.get(5)?,
        urgency: row.get(6)?,
        location: row.get(7)?,
        phone_number: row.get(8)?,
        category_id: row.get(9)?,
        subcategory_id: row.get(10)?,
        submitted_by: row.get(11)?,
        assigned_user: row.get(12)?,
        submitted_at: opt_epoch_col(row, 13)?,
        closed_at: opt_epoch_col(row, 14)?,
        sla_deadline: opt_epoch_col(row, 15)?,
        updated_at: epoch_col(row, 16)?,
    })
}

/// `<CODE>-<YEAR>-<NNNNN>`.
pub fn format_reference(tenant_code: &str, year: i32, seq: i64) -> String {
    format!("{}-{}-{:05}", tenant_code.to_uppercase(), year, seq)
}

impl DeskStore {
    // ── Complaint ──────────────────────────────────────────────────

    /// Number the complaint and insert it in one transaction.
    ///
    /// The sequence is per (tenant, year of `submitted_at`). The generated
    /// reference is written back into `c`.
    pub fn insert_new_complaint(&self, c: &mut ComplaintRecord, tenant_code: &str) -> DeskResult<()> {
        let year = c.submitted_at.unwrap_or(c.updated_at).year();
        let tx = self.conn.unchecked_transaction()?;
        let seq: i64 = tx.query_row(
            "INSERT INTO reference_sequence (tenant_id, year, last_value) VALUES (?1, ?2, 1)
             ON CONFLICT (tenant_id, year) DO UPDATE SET last_value = last_value + 1
             RETURNING last_value",
            params![&c.tenant_id, year],
            |row| row.get(0),
        )?;
        c.reference = format_reference(tenant_code, year, seq);
        tx.execute(
            "INSERT INTO complaint (
                complaint_id, tenant_id, reference, title, description, status, urgency,
                location, phone_number, category_id, subcategory_id, submitted_by,
                assigned_user, submitted_at, closed_at, sla_deadline, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                &c.complaint_id,
                &c.tenant_id,
                &c.reference,
                &c.title,
                &c.description,
                c.status,
                c.urgency,
                &c.location,
                &c.phone_number,
                c.category_id.as_deref(),
                c.subcategory_id.as_deref(),
                c.submitted_by.as_deref(),
                c.assigned_user.as_deref(),
                opt_epoch(c.submitted_at),
                opt_epoch(c.closed_at),
                opt_epoch(c.sla_deadline),
                to_epoch(c.updated_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> DeskResult<ComplaintRecord> {
        self.conn
            .query_row(
                &format!("SELECT {COMPLAINT_COLUMNS} FROM complaint c WHERE c.complaint_id = ?1"),
                params![complaint_id],
                complaint_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::ComplaintNotFound { id: complaint_id.to_string() })
    }

    /// Persist every mutable column. `reference`, `tenant_id` and
    /// `submitted_at` are fixed at creation and not written here.
    pub fn update_complaint(&self, c: &ComplaintRecord) -> DeskResult<()> {
        let n = self.conn.execute(
            "UPDATE complaint SET
                title = ?1, description = ?2, status = ?3, urgency = ?4, location = ?5,
                phone_number = ?6, category_id = ?7, subcategory_id = ?8, assigned_user = ?9,
                closed_at = ?10, sla_deadline = ?11, updated_at = ?12
             WHERE complaint_id = ?13",
            params![
                &c.title,
                &c.description,
                c.status,
                c.urgency,
                &c.location,
                &c.phone_number,
                c.category_id.as_deref(),
                c.subcategory_id.as_deref(),
                c.assigned_user.as_deref(),
                opt_epoch(c.closed_at),
                opt_epoch(c.sla_deadline),
                to_epoch(c.updated_at),
                &c.complaint_id,
            ],
        )?;
        if n == 0 {
            return Err(DeskError::ComplaintNotFound { id: c.complaint_id.clone() });
        }
        Ok(())
    }

    /// Write the DELETED entry and remove the complaint atomically.
    /// Earlier history rows keep their reference; their complaint link is nulled.
    pub fn delete_complaint_with_history(&self, complaint_id: &str, entry: &HistoryEntry) -> DeskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_history_on(&tx, entry)?;
        let n = tx.execute(
            "DELETE FROM complaint WHERE complaint_id = ?1",
            params![complaint_id],
        )?;
        if n == 0 {
            return Err(DeskError::ComplaintNotFound { id: complaint_id.to_string() });
        }
        tx.commit()?;
        Ok(())
    }

    // ── Comments and attachments ───────────────────────────────────

    pub fn insert_comment(&self, k: &Comment) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO complaint_comment (comment_id, tenant_id, complaint_id, user_id, kind, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &k.comment_id,
                &k.tenant_id,
                &k.complaint_id,
                k.user_id.as_deref(),
                k.kind.as_str(),
                &k.note,
                to_epoch(k.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn comments_for(&self, complaint_id: &str) -> DeskResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT comment_id, tenant_id, complaint_id, user_id, kind, note, created_at
             FROM complaint_comment WHERE complaint_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![complaint_id], |row| {
            Ok(Comment {
                comment_id: row.get(0)?,
                tenant_id: row.get(1)?,
                complaint_id: row.get(2)?,
                user_id: row.get(3)?,
                kind: CommentKind::parse(&row.get::<_, String>(4)?).unwrap_or_default(),
                note: row.get(5)?,
                created_at: epoch_col(row, 6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_attachment(&self, a: &Attachment) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO complaint_attachment (
                attachment_id, tenant_id, complaint_id, filename, stored_path, uploaded_by, uploaded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &a.attachment_id,
                &a.tenant_id,
                &a.complaint_id,
                &a.filename,
                &a.stored_path,
                a.uploaded_by.as_deref(),
                to_epoch(a.uploaded_at),
            ],
        )?;
        Ok(())
    }

    pub fn attachments_for(&self, complaint_id: &str) -> DeskResult<Vec<Attachment>> {
        let mut stmt = self.conn.prepare(
            "SELECT attachment_id, tenant_id, complaint_id, filename, stored_path, uploaded_by, uploaded_at
             FROM complaint_attachment WHERE complaint_id = ?1
             ORDER BY uploaded_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![complaint_id], |row| {
            Ok(Attachment {
                attachment_id: row.get(0)?,
                tenant_id: row.get(1)?,
                complaint_id: row.get(2)?,
                filename: row.get(3)?,
                stored_path: row.get(4)?,
                uploaded_by: row.get(5)?,
                uploaded_at: epoch_col(row, 6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Filtered queries and aggregates ────────────────────────────

    fn count_where(&self, filter: &ComplaintFilter, extra: &str) -> DeskResult<i64> {
        let (clause, values) = filter.to_sql();
        self.conn
            .query_row(
                &format!("SELECT COUNT(*) FROM complaint c WHERE {clause}{extra}"),
                params_from_iter(values),
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn count_complaints(&self, filter: &ComplaintFilter) -> DeskResult<i64> {
        self.count_where(filter, "")
    }

    pub fn list_complaints(
        &self,
        filter: &ComplaintFilter,
        order: ComplaintOrder,
        limit: Option<usize>,
    ) -> DeskResult<Vec<ComplaintRecord>> {
        let (clause, mut values) = filter.to_sql();
        let mut sql = format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaint c WHERE {clause} ORDER BY {}",
            order.sql()
        );
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), complaint_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Matching complaints closed on or before their deadline.
    /// Rows missing either timestamp never count as met.
    pub fn count_sla_met(&self, filter: &ComplaintFilter) -> DeskResult<i64> {
        self.count_where(
            filter,
            " AND c.closed_at IS NOT NULL AND c.sla_deadline IS NOT NULL \
             AND c.closed_at <= c.sla_deadline",
        )
    }

    /// Matching complaints with no comment at all.
    pub fn count_without_comments(&self, filter: &ComplaintFilter) -> DeskResult<i64> {
        self.count_where(
            filter,
            " AND NOT EXISTS (SELECT 1 FROM complaint_comment k WHERE k.complaint_id = c.complaint_id)",
        )
    }

    /// Resolution time in hours for every matching complaint that has both
    /// `submitted_at` and `closed_at`.
    pub fn resolution_hours(&self, filter: &ComplaintFilter) -> DeskResult<Vec<f64>> {
        let (clause, values) = filter.to_sql();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT (c.closed_at - c.submitted_at) / 3600.0 FROM complaint c
             WHERE {clause} AND c.closed_at IS NOT NULL AND c.submitted_at IS NOT NULL"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, f64>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// (status name, count) for statuses that occur, most frequent first.
    pub fn count_by_status(&self, filter: &ComplaintFilter) -> DeskResult<Vec<(String, i64)>> {
        let (clause, values) = filter.to_sql();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT c.status, COUNT(*) AS n FROM complaint c WHERE {clause}
             GROUP BY c.status ORDER BY n DESC, c.status ASC"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// (category name, count), most frequent first. Complaints without a
    /// category are grouped under None.
    pub fn count_by_category(
        &self,
        filter: &ComplaintFilter,
        limit: usize,
    ) -> DeskResult<Vec<(Option<String>, i64)>> {
        let (clause, mut values) = filter.to_sql();
        values.push(Value::Integer(limit as i64));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT cat.name, COUNT(*) AS n
             FROM complaint c LEFT JOIN category cat ON cat.category_id = c.category_id
             WHERE {clause}
             GROUP BY cat.name ORDER BY n DESC, cat.name ASC
             LIMIT ?"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_zero_padded_and_uppercased() {
        assert_eq!(format_reference("acme", 2025, 7), "ACME-2025-00007");
        assert_eq!(format_reference("X", 2026, 123456), "X-2026-123456");
    }
}
