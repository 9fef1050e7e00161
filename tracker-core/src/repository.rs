use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::Result;
use crate::entity::Entity;
use crate::storage::{ListQuery, Storage, StoredRecord};
use crate::tenant::TenantId;

/// Typed, tenant-filtered view over a [`Storage`] for one entity kind.
pub struct Repository<E: Entity> {
    storage: Arc<dyn Storage>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.storage.clone())
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            _entity: PhantomData,
        }
    }

    fn to_record(entity: &E) -> Result<StoredRecord> {
        let meta = entity.meta();
        Ok(StoredRecord {
            kind: E::KIND.to_string(),
            id: meta.id,
            tenant_id: meta.tenant_id,
            parent_id: entity.parent_id(),
            data: serde_json::to_value(entity)?,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    fn from_record(record: StoredRecord) -> Result<E> {
        Ok(serde_json::from_value(record.data)?)
    }

    pub async fn add(&self, entity: &E) -> Result<()> {
        self.storage.insert(Self::to_record(entity)?).await
    }

    pub async fn find(&self, tenant: TenantId, id: Uuid) -> Result<Option<E>> {
        self.storage
            .fetch(E::KIND, tenant, id)
            .await?
            .map(Self::from_record)
            .transpose()
    }

    pub async fn list(&self, tenant: TenantId, query: &ListQuery) -> Result<Vec<E>> {
        self.storage
            .list(E::KIND, tenant, query)
            .await?
            .into_iter()
            .map(Self::from_record)
            .collect()
    }

    pub async fn all(&self, tenant: TenantId) -> Result<Vec<E>> {
        self.list(tenant, &ListQuery::all()).await
    }

    /// Persists changes to an existing entity; `false` if it is gone.
    pub async fn save(&self, entity: &E) -> Result<bool> {
        self.storage.replace(Self::to_record(entity)?).await
    }

    pub async fn delete(&self, tenant: TenantId, id: Uuid) -> Result<bool> {
        self.storage.remove(E::KIND, tenant, id).await
    }

    /// Removes rows of every `E::CHILDREN` kind owned by `parent_id`.
    pub async fn delete_children(&self, tenant: TenantId, parent_id: Uuid) -> Result<usize> {
        let mut removed = 0;
        for kind in E::CHILDREN {
            removed += self.storage.remove_by_parent(kind, tenant, parent_id).await?;
        }
        Ok(removed)
    }

    pub async fn count(&self, tenant: TenantId) -> Result<usize> {
        self.storage.count(E::KIND, tenant).await
    }

    /// Whether a row of `kind` with `id` is visible to `tenant`.
    pub async fn exists_kind(&self, kind: &str, tenant: TenantId, id: Uuid) -> Result<bool> {
        Ok(self.storage.fetch(kind, tenant, id).await?.is_some())
    }
}
