//! External service integrations.
//!
//! Concrete storage, story-writer and identity providers are selected from
//! configuration once at startup and shared behind trait objects.

pub mod azure_storage;
pub mod identity;
pub mod openai;
pub mod supabase_storage;

use std::sync::Arc;

use domain::services::{
    IdentityError, IdentityProvider, InMemoryStorage, PassthroughStoryWriter, StorageError,
    StorageProvider, StoryError, StoryWriter,
};
use shared::jwt::JwtError;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

pub use azure_storage::AzureBlobStorage;
pub use identity::{JwtIdentityProvider, SupabaseIdentityProvider};
pub use openai::OpenAiStoryWriter;
pub use supabase_storage::SupabaseStorage;

/// Failure to construct a provider at startup.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    #[error("Storage provider: {0}")]
    Storage(#[from] StorageError),

    #[error("Story writer: {0}")]
    Story(#[from] StoryError),

    #[error("Identity provider: {0}")]
    Identity(#[from] IdentityError),

    #[error("JWT configuration: {0}")]
    Jwt(#[from] JwtError),

    #[error("Unknown {kind} provider '{name}'")]
    Unknown { kind: &'static str, name: String },
}

/// The external collaborators handlers depend on.
#[derive(Clone)]
pub struct Providers {
    pub storage: Arc<dyn StorageProvider>,
    pub story_writer: Arc<dyn StoryWriter>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Providers {
    pub fn from_config(config: &Config) -> Result<Self, ProviderInitError> {
        let storage: Arc<dyn StorageProvider> = match config.storage.provider.as_str() {
            "memory" => Arc::new(InMemoryStorage::new()),
            "supabase" => Arc::new(SupabaseStorage::new(&config.storage)?),
            "azure" => Arc::new(AzureBlobStorage::new(&config.storage)?),
            other => {
                return Err(ProviderInitError::Unknown {
                    kind: "storage",
                    name: other.to_string(),
                })
            }
        };

        let story_writer: Arc<dyn StoryWriter> = if config.ai.enabled {
            Arc::new(OpenAiStoryWriter::new(&config.ai)?)
        } else {
            Arc::new(PassthroughStoryWriter)
        };

        let identity: Arc<dyn IdentityProvider> = match config.auth.mode.as_str() {
            "jwt" => Arc::new(JwtIdentityProvider::new(&config.auth)?),
            "supabase" => Arc::new(SupabaseIdentityProvider::new(&config.auth)?),
            other => {
                return Err(ProviderInitError::Unknown {
                    kind: "auth",
                    name: other.to_string(),
                })
            }
        };

        info!(
            storage = storage.name(),
            ai_enabled = config.ai.enabled,
            auth_mode = %config.auth.mode,
            "External providers configured"
        );

        Ok(Self {
            storage,
            story_writer,
            identity,
        })
    }
}
