//! Repository implementations for database operations.

pub mod event;
pub mod memory;
pub mod profile;

pub use event::{CreateEventError, EventRepository};
pub use memory::{InsertMemoryError, MemoryRepository};
pub use profile::ProfileRepository;
