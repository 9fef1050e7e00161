use super::traits::{ListQuery, Storage, StoredRecord};
use crate::common::error::{Result, TrackerError};
use crate::tenant::TenantId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

type RecordKey = (String, Uuid);

/// In-memory storage implementation for development/testing
#[derive(Clone)]
pub struct InMemoryStorage {
    records: Arc<Mutex<HashMap<RecordKey, StoredRecord>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<RecordKey, StoredRecord>>> {
        self.records
            .lock()
            .map_err(|_| TrackerError::storage("in-memory record store poisoned"))
    }
}

pub(crate) fn page(mut rows: Vec<StoredRecord>, query: &ListQuery) -> Vec<StoredRecord> {
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert(&self, record: StoredRecord) -> Result<()> {
        let key = (record.kind.clone(), record.id);
        let mut records = self.lock()?;
        if records.contains_key(&key) {
            return Err(TrackerError::storage(format!(
                "duplicate {} id {}",
                record.kind, record.id
            )));
        }
        debug!("Inserted {} {} for tenant {}", record.kind, record.id, record.tenant_id);
        records.insert(key, record);
        Ok(())
    }

    async fn fetch(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<Option<StoredRecord>> {
        let records = self.lock()?;
        Ok(records
            .get(&(kind.to_string(), id))
            .filter(|r| r.tenant_id == tenant)
            .cloned())
    }

    async fn list(&self, kind: &str, tenant: TenantId, query: &ListQuery) -> Result<Vec<StoredRecord>> {
        let records = self.lock()?;
        let rows: Vec<StoredRecord> = records
            .values()
            .filter(|r| {
                r.kind == kind
                    && r.tenant_id == tenant
                    && query.parent_id.map_or(true, |p| r.parent_id == Some(p))
            })
            .cloned()
            .collect();
        Ok(page(rows, query))
    }

    async fn replace(&self, record: StoredRecord) -> Result<bool> {
        let key = (record.kind.clone(), record.id);
        let mut records = self.lock()?;
        match records.get_mut(&key) {
            Some(existing) if existing.tenant_id == record.tenant_id => {
                debug!("Replaced {} {}", record.kind, record.id);
                *existing = record;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<bool> {
        let key = (kind.to_string(), id);
        let mut records = self.lock()?;
        let owned = records.get(&key).map_or(false, |r| r.tenant_id == tenant);
        if owned {
            records.remove(&key);
            debug!("Removed {} {}", kind, id);
        }
        Ok(owned)
    }

    async fn remove_by_parent(&self, kind: &str, tenant: TenantId, parent_id: Uuid) -> Result<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, r| {
            !(r.kind == kind && r.tenant_id == tenant && r.parent_id == Some(parent_id))
        });
        Ok(before - records.len())
    }

    async fn count(&self, kind: &str, tenant: TenantId) -> Result<usize> {
        let records = self.lock()?;
        Ok(records
            .values()
            .filter(|r| r.kind == kind && r.tenant_id == tenant)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn record(kind: &str, tenant: TenantId, parent_id: Option<Uuid>, offset_secs: i64) -> StoredRecord {
        StoredRecord {
            kind: kind.to_string(),
            id: Uuid::new_v4(),
            tenant_id: tenant,
            parent_id,
            data: json!({ "n": offset_secs }),
            created_at: Utc::now() + Duration::seconds(offset_secs),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn rows_are_invisible_across_tenants() {
        let storage = InMemoryStorage::new();
        let alice = TenantId::random();
        let bob = TenantId::random();
        let row = record("goal", alice, None, 0);
        let id = row.id;
        storage.insert(row.clone()).await.unwrap();

        assert!(storage.fetch("goal", alice, id).await.unwrap().is_some());
        assert!(storage.fetch("goal", bob, id).await.unwrap().is_none());
        assert!(storage.list("goal", bob, &ListQuery::all()).await.unwrap().is_empty());

        let mut hijack = row.clone();
        hijack.tenant_id = bob;
        assert!(!storage.replace(hijack).await.unwrap());
        assert!(!storage.remove("goal", bob, id).await.unwrap());
        assert_eq!(storage.count("goal", alice).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_orders_by_creation_and_pages() {
        let storage = InMemoryStorage::new();
        let tenant = TenantId::random();
        for offset in [30, 10, 20] {
            storage.insert(record("vehicle", tenant, None, offset)).await.unwrap();
        }

        let all = storage.list("vehicle", tenant, &ListQuery::all()).await.unwrap();
        let order: Vec<i64> = all.iter().map(|r| r.data["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![10, 20, 30]);

        let query = ListQuery { offset: Some(1), limit: Some(1), ..ListQuery::default() };
        let paged = storage.list("vehicle", tenant, &query).await.unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].data["n"], 20);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let storage = InMemoryStorage::new();
        let row = record("payment", TenantId::random(), None, 0);
        storage.insert(row.clone()).await.unwrap();
        assert!(matches!(
            storage.insert(row).await,
            Err(TrackerError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn remove_by_parent_only_touches_matching_children() {
        let storage = InMemoryStorage::new();
        let tenant = TenantId::random();
        let other = TenantId::random();
        let parent = Uuid::new_v4();
        storage.insert(record("reminder", tenant, Some(parent), 0)).await.unwrap();
        storage.insert(record("reminder", tenant, Some(parent), 1)).await.unwrap();
        storage.insert(record("reminder", tenant, Some(Uuid::new_v4()), 2)).await.unwrap();
        storage.insert(record("reminder", other, Some(parent), 3)).await.unwrap();

        let removed = storage.remove_by_parent("reminder", tenant, parent).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(storage.count("reminder", tenant).await.unwrap(), 1);
        assert_eq!(storage.count("reminder", other).await.unwrap(), 1);
    }
}
