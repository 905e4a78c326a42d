//! Domain models for Elite Memoriz.

pub mod event;
pub mod memory;
pub mod profile;
pub mod tier;

pub use event::{
    CreateEventRequest, DeleteEventResponse, Event, EventCategory, EventWithMemories,
    PublicEventResponse,
};
pub use memory::{
    DeleteMemoryResponse, Memory, MemoryType, NewMemory, UpdateMemoryRequest,
    UploadMemoryResponse,
};
pub use profile::{Profile, ProfileRole, RegisterProfileRequest};
pub use tier::{Tier, TierLimits};
