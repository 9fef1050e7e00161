use super::traits::{ListQuery, Storage, StoredRecord};
use crate::common::error::{Result, TrackerError};
use crate::tenant::TenantId;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT kind, id, tenant_id, parent_id, data, created_at, updated_at FROM records";

/// SQLite-backed storage. All rows live in one `records` table keyed by
/// `(kind, id)`; every statement carries the tenant predicate.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| TrackerError::storage(format!("create {}: {e}", parent.display())))?;
            }
        }
        info!("Opening SQLite store at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        let storage = Self { conn: Mutex::new(conn) };
        storage.run_migrations()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        let conn = self.lock()?;
        let migration_sql_001 = include_str!("../../migrations/001_create_records.sql");
        conn.execute_batch(migration_sql_001)
            .map_err(|e| TrackerError::storage(format!("Failed to run base migration: {e}")))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::storage("sqlite connection poisoned"))
    }
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| TrackerError::storage(format!("bad timestamp '{raw}': {e}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| TrackerError::storage(format!("bad uuid '{raw}': {e}")))
}

struct RawRow {
    kind: String,
    id: String,
    tenant_id: String,
    parent_id: Option<String>,
    data: String,
    created_at: String,
    updated_at: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            kind: row.get(0)?,
            id: row.get(1)?,
            tenant_id: row.get(2)?,
            parent_id: row.get(3)?,
            data: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<StoredRecord> {
        Ok(StoredRecord {
            kind: self.kind,
            id: parse_uuid(&self.id)?,
            tenant_id: TenantId::new(parse_uuid(&self.tenant_id)?),
            parent_id: self.parent_id.as_deref().map(parse_uuid).transpose()?,
            data: serde_json::from_str(&self.data)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn insert(&self, record: StoredRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (kind, id, tenant_id, parent_id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.kind,
                record.id.to_string(),
                record.tenant_id.to_string(),
                record.parent_id.map(|p| p.to_string()),
                serde_json::to_string(&record.data)?,
                timestamp(&record.created_at),
                record.updated_at.as_ref().map(timestamp),
            ],
        )
        .map_err(|e| TrackerError::storage(format!("Failed to insert {} {}: {e}", record.kind, record.id)))?;
        debug!("Inserted {} {}", record.kind, record.id);
        Ok(())
    }

    async fn fetch(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<Option<StoredRecord>> {
        let conn = self.lock()?;
        let sql = format!("{SELECT_COLUMNS} WHERE kind = ?1 AND tenant_id = ?2 AND id = ?3");
        let raw = conn
            .query_row(&sql, params![kind, tenant.to_string(), id.to_string()], RawRow::read)
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }

    async fn list(&self, kind: &str, tenant: TenantId, query: &ListQuery) -> Result<Vec<StoredRecord>> {
        let conn = self.lock()?;
        let limit = query.limit.map_or(-1, |l| l as i64);
        let offset = query.offset.unwrap_or(0) as i64;
        let raws = match query.parent_id {
            Some(parent) => {
                let sql = format!(
                    "{SELECT_COLUMNS} WHERE kind = ?1 AND tenant_id = ?2 AND parent_id = ?3
                     ORDER BY created_at, id LIMIT ?4 OFFSET ?5"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(
                    params![kind, tenant.to_string(), parent.to_string(), limit, offset],
                    RawRow::read,
                )?;
                let collected = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                collected
            }
            None => {
                let sql = format!(
                    "{SELECT_COLUMNS} WHERE kind = ?1 AND tenant_id = ?2
                     ORDER BY created_at, id LIMIT ?3 OFFSET ?4"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![kind, tenant.to_string(), limit, offset], RawRow::read)?;
                let collected = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                collected
            }
        };
        raws.into_iter().map(RawRow::into_record).collect()
    }

    async fn replace(&self, record: StoredRecord) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE records SET parent_id = ?4, data = ?5, updated_at = ?6
             WHERE kind = ?1 AND id = ?2 AND tenant_id = ?3",
            params![
                record.kind,
                record.id.to_string(),
                record.tenant_id.to_string(),
                record.parent_id.map(|p| p.to_string()),
                serde_json::to_string(&record.data)?,
                record.updated_at.as_ref().map(timestamp),
            ],
        )?;
        Ok(changed > 0)
    }

    async fn remove(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM records WHERE kind = ?1 AND tenant_id = ?2 AND id = ?3",
            params![kind, tenant.to_string(), id.to_string()],
        )?;
        Ok(changed > 0)
    }

    async fn remove_by_parent(&self, kind: &str, tenant: TenantId, parent_id: Uuid) -> Result<usize> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM records WHERE kind = ?1 AND tenant_id = ?2 AND parent_id = ?3",
            params![kind, tenant.to_string(), parent_id.to_string()],
        )?;
        Ok(changed)
    }

    async fn count(&self, kind: &str, tenant: TenantId) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1 AND tenant_id = ?2",
            params![kind, tenant.to_string()],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}
