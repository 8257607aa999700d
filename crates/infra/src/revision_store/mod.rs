//! Persistence of transformation revisions.
//!
//! - `RevisionStore`: storage abstraction (sync, short critical sections)
//! - `InMemoryRevisionStore`: process-local implementation

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryRevisionStore;
pub use r#trait::{RevisionFilter, RevisionStore, RevisionStoreError, UpdateOptions};
