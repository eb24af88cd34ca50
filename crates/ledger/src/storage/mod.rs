pub mod entities;
pub mod interfaces;
pub mod memory;
pub mod snapshot;
pub mod sqlite;

pub use interfaces::{KeyValueStore, StoreError};
pub use memory::InMemoryKeyValueStore;
pub use snapshot::{DatabaseSnapshot, MASTER_KEY};
pub use sqlite::SqliteKeyValueStore;
