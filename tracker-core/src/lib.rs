pub mod common;
pub mod domain;
pub mod entity;
pub mod repository;
pub mod storage;
pub mod tenant;

pub use common::{Result, TrackerError};
pub use entity::{Entity, ParentRef, RecordMeta};
pub use repository::Repository;
pub use storage::{InMemoryStorage, ListQuery, Storage, StoredRecord};
pub use tenant::TenantId;

// SQLite backend is only compiled with the db feature
#[cfg(feature = "db")]
pub use storage::SqliteStorage;
