//! Persisted user-profile attribute store.
//!
//! The store keeps a single per-device map of attribute name to value,
//! always read and written as one unit. Mutations are validated against
//! a closed value type set before anything touches storage: one bad
//! value rejects the whole batch, and an empty-string value deletes the
//! attribute it names.

mod backend;
mod error;
mod migration;
mod store;
mod value;

pub use backend::{FsBackend, MemoryBackend, ProfileBackend};
pub use error::StoreError;
pub use migration::migrate_if_needed;
pub use store::AttributeStore;
pub use value::{map_from_json, map_to_json, AttributeMap, AttributeValue};
