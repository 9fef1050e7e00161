use tracing::{error, info};
use tracker_core::{Entity, RecordMeta, Result, TenantId, TrackerError};
use uuid::Uuid;

use super::TrackerService;
use crate::events::EventAction;
use crate::metrics;

impl TrackerService {
    /// Rejects a child whose parent is missing or belongs to another tenant.
    async fn ensure_parent<E: Entity>(&self, tenant: TenantId, entity: &E) -> Result<()> {
        if let (Some(parent), Some(parent_id)) = (E::PARENT, entity.parent_id()) {
            let repo = self.repository::<E>();
            if !repo.exists_kind(parent.kind, tenant, parent_id).await? {
                return Err(TrackerError::not_found(parent.kind, parent_id));
            }
        }
        Ok(())
    }

    pub async fn create<E: Entity>(&self, tenant: TenantId, draft: E::Draft) -> Result<E> {
        let entity = E::from_draft(draft, RecordMeta::new(tenant))?;
        self.ensure_parent(tenant, &entity).await?;
        self.repository::<E>().add(&entity).await.map_err(|e| {
            error!(kind = E::KIND, id = %entity.id(), "failed to create: {}", e);
            e
        })?;
        metrics::record_command(E::KIND, "create");
        info!(kind = E::KIND, id = %entity.id(), tenant = %tenant, "created");
        self.emit(EventAction::Created, tenant, &entity).await;
        Ok(entity)
    }

    /// Replaces the mutable fields of an existing entity. `None` when the
    /// entity is not visible to `tenant`.
    pub async fn update<E: Entity>(
        &self,
        tenant: TenantId,
        id: Uuid,
        draft: E::Draft,
    ) -> Result<Option<E>> {
        let repo = self.repository::<E>();
        let Some(existing) = repo.find(tenant, id).await? else {
            return Ok(None);
        };
        let entity = E::apply_update(&existing, draft)?;
        self.ensure_parent(tenant, &entity).await?;
        self.save(tenant, &entity).await
    }

    /// Persists an already-modified entity and publishes `Updated`.
    pub(crate) async fn save<E: Entity>(&self, tenant: TenantId, entity: &E) -> Result<Option<E>> {
        let saved = self.repository::<E>().save(entity).await.map_err(|e| {
            error!(kind = E::KIND, id = %entity.id(), "failed to update: {}", e);
            e
        })?;
        if !saved {
            return Ok(None);
        }
        metrics::record_command(E::KIND, "update");
        info!(kind = E::KIND, id = %entity.id(), tenant = %tenant, "updated");
        self.emit(EventAction::Updated, tenant, entity).await;
        Ok(Some(entity.clone()))
    }

    /// [`save`](Self::save) for use cases that already loaded the entity; a
    /// row deleted in the meantime is `NotFound`.
    pub(crate) async fn persist<E: Entity>(&self, tenant: TenantId, entity: &E) -> Result<()> {
        match self.save(tenant, entity).await? {
            Some(_) => Ok(()),
            None => Err(TrackerError::not_found(E::KIND, entity.id())),
        }
    }

    /// Removes the entity and every row it owns. `false` when not found.
    pub async fn delete<E: Entity>(&self, tenant: TenantId, id: Uuid) -> Result<bool> {
        let repo = self.repository::<E>();
        let Some(existing) = repo.find(tenant, id).await? else {
            return Ok(false);
        };
        let cascaded = repo.delete_children(tenant, id).await?;
        let removed = repo.delete(tenant, id).await.map_err(|e| {
            error!(kind = E::KIND, id = %id, "failed to delete: {}", e);
            e
        })?;
        if removed {
            metrics::record_command(E::KIND, "delete");
            info!(kind = E::KIND, id = %id, tenant = %tenant, cascaded, "deleted");
            self.emit(EventAction::Deleted, tenant, &existing).await;
        }
        Ok(removed)
    }
}
