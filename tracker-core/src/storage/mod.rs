pub mod in_memory;
#[cfg(feature = "db")]
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemoryStorage;
#[cfg(feature = "db")]
pub use sqlite::SqliteStorage;
pub use traits::{ListQuery, Storage, StoredRecord};
