//! Caption-to-story rewriting.
//!
//! The rewrite is performed by an external AI service. It never blocks an
//! upload: any failure falls back to the guest's original text.

use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Errors returned by story writers.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Story writer disabled")]
    Disabled,

    #[error("Story request failed: {0}")]
    Http(String),

    #[error("Story service returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Image attached to a caption.
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub bytes: &'a [u8],
    pub mime_type: &'a str,
}

/// Input for one rewrite.
#[derive(Debug, Clone, Copy)]
pub struct StoryInput<'a> {
    pub text: &'a str,
    pub image: Option<ImageInput<'a>>,
}

/// Result of [`rewrite_or_original`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryOutcome {
    pub story: String,
    /// True when the original text was used because the writer failed.
    pub fell_back: bool,
}

#[async_trait::async_trait]
pub trait StoryWriter: Send + Sync {
    /// Rewrites the caption (and optional image) into a short story.
    async fn rewrite(&self, input: StoryInput<'_>) -> Result<String, StoryError>;
}

/// Runs `writer` and substitutes the original text on any error or empty result.
pub async fn rewrite_or_original(writer: &dyn StoryWriter, input: StoryInput<'_>) -> StoryOutcome {
    match writer.rewrite(input).await {
        Ok(story) if !story.trim().is_empty() => StoryOutcome {
            story: story.trim().to_string(),
            fell_back: false,
        },
        Ok(_) => {
            tracing::warn!("Story writer returned empty text, using original caption");
            StoryOutcome {
                story: input.text.to_string(),
                fell_back: true,
            }
        }
        Err(StoryError::Disabled) => StoryOutcome {
            story: input.text.to_string(),
            fell_back: true,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Story rewrite failed, using original caption");
            StoryOutcome {
                story: input.text.to_string(),
                fell_back: true,
            }
        }
    }
}

/// Writer used when no AI service is configured.
#[derive(Debug, Clone, Default)]
pub struct PassthroughStoryWriter;

#[async_trait::async_trait]
impl StoryWriter for PassthroughStoryWriter {
    async fn rewrite(&self, _input: StoryInput<'_>) -> Result<String, StoryError> {
        Err(StoryError::Disabled)
    }
}

/// Scripted writer for tests.
#[derive(Debug, Default)]
pub struct MockStoryWriter {
    /// Prefix prepended to the caption.
    pub prefix: String,
    /// Whether to simulate failures.
    pub simulate_failure: bool,
    calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl MockStoryWriter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StoryWriter for MockStoryWriter {
    async fn rewrite(&self, input: StoryInput<'_>) -> Result<String, StoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if input.image.is_some() {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
        }
        if self.simulate_failure {
            return Err(StoryError::Http("simulated failure".to_string()));
        }
        Ok(format!("{}{}", self.prefix, input.text))
    }
}
