use super::{bool_col, epoch_col, opt_epoch_col, to_epoch, DeskStore};
use crate::{
    error::DeskResult,
    notify::{Notification, NotificationKind},
};
use chrono::{DateTime, Utc};
use rusqlite::params;

impl DeskStore {
    // ── Notification ───────────────────────────────────────────────

    pub fn insert_notification(&self, n: &Notification) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO notification (
                notification_id, tenant_id, user_id, kind, title, message, link,
                complaint_id, is_read, read_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &n.notification_id,
                n.tenant_id.as_deref(),
                &n.user_id,
                n.kind.as_str(),
                &n.title,
                &n.message,
                n.link.as_deref(),
                n.complaint_id.as_deref(),
                n.is_read as i32,
                n.read_at.map(to_epoch),
                to_epoch(n.created_at),
            ],
        )?;
        Ok(())
    }

    /// Newest first.
    pub fn unread_notifications(&self, user_id: &str) -> DeskResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            "SELECT notification_id, tenant_id, user_id, kind, title, message, link,
                    complaint_id, is_read, read_at, created_at
             FROM notification WHERE user_id = ?1 AND is_read = 0
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Notification {
                notification_id: row.get(0)?,
                tenant_id: row.get(1)?,
                user_id: row.get(2)?,
                kind: NotificationKind::parse(&row.get::<_, String>(3)?),
                title: row.get(4)?,
                message: row.get(5)?,
                link: row.get(6)?,
                complaint_id: row.get(7)?,
                is_read: bool_col(row, 8)?,
                read_at: opt_epoch_col(row, 9)?,
                created_at: epoch_col(row, 10)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sets `read_at` only on the first call. Returns whether a row changed.
    pub fn mark_notification_read(&self, notification_id: &str, at: DateTime<Utc>) -> DeskResult<bool> {
        let n = self.conn.execute(
            "UPDATE notification SET is_read = 1, read_at = ?1
             WHERE notification_id = ?2 AND is_read = 0",
            params![to_epoch(at), notification_id],
        )?;
        Ok(n > 0)
    }
}
