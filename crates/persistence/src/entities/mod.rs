//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod event;
pub mod memory;
pub mod profile;

pub use event::{EventEntity, EventUsageEntity};
pub use memory::MemoryEntity;
pub use profile::ProfileEntity;
