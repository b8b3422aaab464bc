//! SQLite persistence layer.
//!
//! RULE: Only the store module talks to the database.
//! Services and the statistics aggregator call store methods; they never
//! execute SQL directly.
//!
//! Timestamps are persisted as UTC epoch seconds. Enumerations are
//! persisted as their SCREAMING_SNAKE_CASE names.

mod complaint;
mod filter;
mod history;
mod notification;
mod sla;
mod tenancy;

pub use complaint::format_reference;
pub use filter::{AssigneeFilter, ComplaintFilter, ComplaintOrder};

use crate::{
    error::DeskResult,
    history::HistoryAction,
    types::{Status, Urgency},
};
use chrono::{DateTime, Utc};
use rusqlite::{
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef},
    Connection, ToSql,
};

pub struct DeskStore {
    conn: Connection,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_tenancy.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_complaints.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_sla_history.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_notifications.sql"))?;
        Ok(())
    }
}

// ── Column conversions ───────────────────────────────────────────────────────

pub(crate) fn to_epoch(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub(crate) fn opt_epoch(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(to_epoch)
}

/// Read an epoch-seconds column at `idx`.
pub(crate) fn epoch_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

pub(crate) fn opt_epoch_col(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .map(Some)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs)),
        None => Ok(None),
    }
}

pub(crate) fn bool_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i32>(idx)? != 0)
}

/// Parse a JSON snapshot column, keeping the column index in the error.
pub(crate) fn json_col<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

macro_rules! text_enum_sql {
    ($($ty:ty),+) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

text_enum_sql!(Status, Urgency, HistoryAction);
