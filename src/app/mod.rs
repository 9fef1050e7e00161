//! Command and query handlers over the tracker repositories.
//!
//! Commands (create/update/delete) and queries (get/list) are generic over
//! [`Entity`]; the per-domain use cases build on them.

pub mod commands;
pub mod queries;

pub mod financial_goals_use_case;
pub mod health_screening_use_case;
pub mod mortgage_use_case;
pub mod time_audit_use_case;
pub mod vehicle_maintenance_use_case;

use std::sync::Arc;

use serde::Serialize;
use tracker_core::{Entity, Repository, Storage, TenantId};

use crate::events::{publish_best_effort, DomainEvent, EventAction, EventPublisher};

#[derive(Clone)]
pub struct TrackerService {
    storage: Arc<dyn Storage>,
    publisher: Arc<dyn EventPublisher>,
}

impl TrackerService {
    pub fn new(storage: Arc<dyn Storage>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { storage, publisher }
    }

    pub fn repository<E: Entity>(&self) -> Repository<E> {
        Repository::new(self.storage.clone())
    }

    /// Publishes `<Kind><Action>` with the entity's DTO as payload.
    pub(crate) async fn emit<E: Entity>(&self, action: EventAction, tenant: TenantId, entity: &E) {
        self.emit_with(action, tenant, entity, &entity.clone().to_dto()).await;
    }

    /// Publishes `<Kind><Action>` for `entity` with a custom payload.
    pub(crate) async fn emit_with<E: Entity, P: Serialize>(
        &self,
        action: EventAction,
        tenant: TenantId,
        entity: &E,
        payload: &P,
    ) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(kind = E::KIND, "event payload not serializable: {}", e);
                serde_json::Value::Null
            }
        };
        let event = DomainEvent::new(E::KIND, action, entity.id(), tenant, payload);
        publish_best_effort(self.publisher.as_ref(), event).await;
    }
}
