use tracing::debug;
use tracker_core::{Entity, ListQuery, Result, TenantId, TrackerError};
use uuid::Uuid;

use super::TrackerService;
use crate::metrics;

impl TrackerService {
    pub async fn get<E: Entity>(&self, tenant: TenantId, id: Uuid) -> Result<Option<E>> {
        metrics::record_query(E::KIND);
        self.repository::<E>().find(tenant, id).await
    }

    /// Like [`get`](Self::get) but a missing entity is a `NotFound` error.
    pub async fn require<E: Entity>(&self, tenant: TenantId, id: Uuid) -> Result<E> {
        self.get(tenant, id)
            .await?
            .ok_or_else(|| TrackerError::not_found(E::KIND, id))
    }

    pub async fn list<E: Entity>(&self, tenant: TenantId, query: &ListQuery) -> Result<Vec<E>> {
        metrics::record_query(E::KIND);
        let rows = self.repository::<E>().list(tenant, query).await?;
        debug!(kind = E::KIND, count = rows.len(), "listed");
        Ok(rows)
    }
}
