use super::{bool_col, epoch_col, to_epoch, DeskStore};
use crate::{
    directory::{Category, SubCategory, Tenant, User},
    error::{DeskError, DeskResult},
    types::Role,
};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension};

const TENANT_COLUMNS: &str = "tenant_id, code, name, zone, is_active, is_premium, created_at";
const USER_COLUMNS: &str =
    "user_id, tenant_id, email, first_name, last_name, role, is_active, date_joined";

fn tenant_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        tenant_id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        zone: row.get(3)?,
        is_active: bool_col(row, 4)?,
        is_premium: bool_col(row, 5)?,
        created_at: epoch_col(row, 6)?,
    })
}

fn user_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        tenant_id: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        role: row.get(5)?,
        is_active: bool_col(row, 6)?,
        date_joined: epoch_col(row, 7)?,
    })
}

impl DeskStore {
    // ── Tenant ─────────────────────────────────────────────────────

    pub fn insert_tenant(&self, t: &Tenant) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO tenant (tenant_id, code, name, zone, is_active, is_premium, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &t.tenant_id,
                &t.code,
                &t.name,
                &t.zone,
                t.is_active as i32,
                t.is_premium as i32,
                to_epoch(t.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_tenant(&self, tenant_id: &str) -> DeskResult<Tenant> {
        self.conn
            .query_row(
                &format!("SELECT {TENANT_COLUMNS} FROM tenant WHERE tenant_id = ?1"),
                params![tenant_id],
                tenant_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::TenantNotFound { id: tenant_id.to_string() })
    }

    pub fn list_active_tenants(&self) -> DeskResult<Vec<Tenant>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TENANT_COLUMNS} FROM tenant WHERE is_active = 1 ORDER BY name ASC"
        ))?;
        let rows = stmt.query_map([], tenant_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Category ───────────────────────────────────────────────────

    pub fn insert_category(&self, c: &Category) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO category (category_id, tenant_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &c.category_id,
                &c.tenant_id,
                &c.name,
                &c.description,
                to_epoch(c.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_category(&self, category_id: &str) -> DeskResult<Option<Category>> {
        self.conn
            .query_row(
                "SELECT category_id, tenant_id, name, description, created_at
                 FROM category WHERE category_id = ?1",
                params![category_id],
                |row| {
                    Ok(Category {
                        category_id: row.get(0)?,
                        tenant_id: row.get(1)?,
                        name: row.get(2)?,
                        description: row.get(3)?,
                        created_at: epoch_col(row, 4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn insert_subcategory(&self, s: &SubCategory) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO subcategory (subcategory_id, tenant_id, category_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &s.subcategory_id,
                &s.tenant_id,
                &s.category_id,
                &s.name,
                &s.description,
                to_epoch(s.created_at),
            ],
        )?;
        Ok(())
    }

    // ── User ───────────────────────────────────────────────────────

    pub fn insert_user(&self, u: &User) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO app_user (
                user_id, tenant_id, email, first_name, last_name, role, is_active, date_joined
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &u.user_id,
                u.tenant_id.as_deref(),
                &u.email,
                &u.first_name,
                &u.last_name,
                &u.role,
                u.is_active as i32,
                to_epoch(u.date_joined),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> DeskResult<User> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM app_user WHERE user_id = ?1"),
                params![user_id],
                user_row_mapper,
            )
            .optional()?
            .ok_or_else(|| DeskError::UserNotFound { id: user_id.to_string() })
    }

    /// Users of a tenant holding one of `roles`, ordered by name.
    pub fn list_users(&self, tenant_id: &str, roles: &[Role], active_only: bool) -> DeskResult<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let role_marks = vec!["?"; roles.len()].join(", ");
        let mut sql = format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE tenant_id = ? AND role IN ({role_marks})"
        );
        if active_only {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY first_name ASC, last_name ASC, user_id ASC");

        let mut values = vec![Value::Text(tenant_id.to_string())];
        values.extend(roles.iter().map(|r| Value::Text(r.as_str().to_string())));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), user_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_active_tenants(&self) -> DeskResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM tenant WHERE is_active = 1", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
