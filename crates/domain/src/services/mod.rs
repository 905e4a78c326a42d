//! Domain services for Elite Memoriz.
//!
//! Policies (quotas, ownership) are plain functions; external capabilities
//! (object storage, story rewriting, identity) are traits with in-process
//! implementations for development and tests.

pub mod access;
pub mod identity;
pub mod quota;
pub mod storage;
pub mod story;

pub use access::{can_manage, Caller};
pub use identity::{Identity, IdentityError, IdentityProvider};
pub use quota::{check_event_creation, check_upload, QuotaViolation};
pub use storage::{InMemoryStorage, StorageError, StorageProvider};
pub use story::{
    rewrite_or_original, ImageInput, MockStoryWriter, PassthroughStoryWriter, StoryError,
    StoryInput, StoryOutcome, StoryWriter,
};
