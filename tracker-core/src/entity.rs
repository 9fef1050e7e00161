use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::Result;
use crate::tenant::TenantId;

/// Identity and audit columns shared by every tracked entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    /// Fresh identity for a row about to be inserted.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Same identity, stamped as modified now.
    pub fn touched(&self) -> Self {
        Self {
            updated_at: Some(Utc::now()),
            ..self.clone()
        }
    }
}

/// Foreign key from a child entity to the entity that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef {
    /// `Entity::KIND` of the owning entity
    pub kind: &'static str,
    /// Field name carrying the owner's id, also accepted as a list filter
    pub field: &'static str,
}

/// A tenant-scoped row with a request shape (`Draft`) and a response shape (`Dto`).
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Storage discriminator, e.g. `screening`.
    const KIND: &'static str;
    /// REST collection segment, e.g. `screenings`.
    const COLLECTION: &'static str;
    const PARENT: Option<ParentRef> = None;
    /// Kinds whose rows reference this entity and are removed with it.
    const CHILDREN: &'static [&'static str] = &[];

    type Draft: DeserializeOwned + Send + 'static;
    type Dto: Serialize + From<Self> + Send + Sync + 'static;

    fn meta(&self) -> &RecordMeta;

    fn parent_id(&self) -> Option<Uuid> {
        None
    }

    /// Builds (and validates) an entity from a create or update request.
    fn from_draft(draft: Self::Draft, meta: RecordMeta) -> Result<Self>;

    /// Builds the replacement for `existing` from an update request. Entities
    /// with transition rules between stored and requested state override this.
    fn apply_update(existing: &Self, draft: Self::Draft) -> Result<Self> {
        Self::from_draft(draft, existing.meta().touched())
    }

    fn id(&self) -> Uuid {
        self.meta().id
    }

    fn tenant_id(&self) -> TenantId {
        self.meta().tenant_id
    }

    fn to_dto(self) -> Self::Dto {
        Self::Dto::from(self)
    }
}
