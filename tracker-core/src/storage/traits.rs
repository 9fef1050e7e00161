use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::Result;
use crate::tenant::TenantId;

/// Untyped row as persisted by a storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub kind: String,
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub parent_id: Option<Uuid>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Filtering and paging for list queries. Ordering is always
/// `created_at` ascending, then `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub parent_id: Option<Uuid>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn children_of(parent_id: Uuid) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }
}

/// Storage trait for tenant-scoped tracker records
#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert(&self, record: StoredRecord) -> Result<()>;
    async fn fetch(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<Option<StoredRecord>>;
    async fn list(&self, kind: &str, tenant: TenantId, query: &ListQuery) -> Result<Vec<StoredRecord>>;

    /// Overwrites an existing row. Returns `false` when no row with the same
    /// kind, tenant and id exists.
    async fn replace(&self, record: StoredRecord) -> Result<bool>;
    async fn remove(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<bool>;
    async fn remove_by_parent(&self, kind: &str, tenant: TenantId, parent_id: Uuid) -> Result<usize>;
    async fn count(&self, kind: &str, tenant: TenantId) -> Result<usize>;
}
