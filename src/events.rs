//! Domain events emitted after successful commands.
//!
//! Delivery is best effort: a publisher failure is logged and counted but
//! never fails the command that produced the event.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracker_core::TenantId;
use uuid::Uuid;

use crate::config::{EventsConfig, PublisherKind};
use crate::error::{AppError, Result};
use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    /// A running time block was stopped
    Ended,
    /// A time goal met its weekly target
    Achieved,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Created => "Created",
            EventAction::Updated => "Updated",
            EventAction::Deleted => "Deleted",
            EventAction::Ended => "Ended",
            EventAction::Achieved => "Achieved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: Uuid,
    /// e.g. `TimeBlockCreated`
    pub event_type: String,
    pub kind: String,
    pub entity_id: Uuid,
    pub tenant_id: TenantId,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl DomainEvent {
    pub fn new(
        kind: &str,
        action: EventAction,
        entity_id: Uuid,
        tenant_id: TenantId,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: format!("{}{}", pascal_case(kind), action.as_str()),
            kind: kind.to_string(),
            entity_id,
            tenant_id,
            occurred_at: Utc::now(),
            payload,
        }
    }
}

fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    fn name(&self) -> &'static str;
    async fn publish(&self, event: &DomainEvent) -> Result<()>;
}

/// Writes events to the tracing log.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        info!(
            event_type = %event.event_type,
            entity_id = %event.entity_id,
            tenant_id = %event.tenant_id,
            "domain event"
        );
        Ok(())
    }
}

/// POSTs each event as JSON to a fixed URL.
pub struct WebhookPublisher {
    client: reqwest::Client,
    url: String,
}

impl WebhookPublisher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl EventPublisher for WebhookPublisher {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn publish(&self, _event: &DomainEvent) -> Result<()> {
        Ok(())
    }
}

/// Keeps published events in memory; handy for embedding and tests.
#[derive(Clone, Default)]
pub struct MemoryPublisher {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| AppError::Publish("event buffer lock poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

pub fn build_publisher(config: &EventsConfig) -> Result<Arc<dyn EventPublisher>> {
    let publisher: Arc<dyn EventPublisher> = match config.publisher {
        PublisherKind::Log => Arc::new(LogPublisher),
        PublisherKind::None => Arc::new(NoopPublisher),
        PublisherKind::Webhook => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                AppError::Config("events.webhook_url is required for the webhook publisher".to_string())
            })?;
            Arc::new(WebhookPublisher::new(url, Duration::from_millis(config.timeout_ms))?)
        }
    };
    Ok(publisher)
}

/// Publishes `event`, logging and counting failures instead of returning them.
pub async fn publish_best_effort(publisher: &dyn EventPublisher, event: DomainEvent) {
    match publisher.publish(&event).await {
        Ok(()) => {
            metrics::record_event(true);
            debug!(
                publisher = publisher.name(),
                event_type = %event.event_type,
                "event published"
            );
        }
        Err(e) => {
            metrics::record_event(false);
            warn!(
                publisher = publisher.name(),
                event_type = %event.event_type,
                entity_id = %event.entity_id,
                "failed to publish event: {}",
                e
            );
        }
    }
}
