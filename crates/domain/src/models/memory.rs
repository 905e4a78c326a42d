//! Memory domain models (guest submissions).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length kept from a guest-supplied filename.
const MAX_FILENAME_LEN: usize = 100;

/// Kind of guest submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    #[default]
    Photo,
    Video,
    Story,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Photo => "photo",
            MemoryType::Video => "video",
            MemoryType::Story => "story",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Classifies an uploaded file by its MIME type.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.to_ascii_lowercase().starts_with("video/") {
            MemoryType::Video
        } else {
            MemoryType::Photo
        }
    }
}

impl FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "photo" => Ok(MemoryType::Photo),
            "video" => Ok(MemoryType::Video),
            "story" => Ok(MemoryType::Story),
            _ => Err(format!("Invalid memory type: {}", s)),
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single guest submission belonging to one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: i64,
    pub event_id: Uuid,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    pub storage_path: String,
    pub original_text: Option<String>,
    pub ai_story: Option<String>,
    pub is_approved: bool,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a new memory row.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub event_id: Uuid,
    pub memory_type: MemoryType,
    pub storage_path: String,
    pub original_text: Option<String>,
    pub ai_story: Option<String>,
    pub file_size: i64,
}

/// Request payload for `PATCH /api/host/memories/:id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoryRequest {
    pub is_approved: bool,
}

/// Response for a successful guest upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMemoryResponse {
    pub message: String,
    pub story: String,
}

/// Response for memory deletion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMemoryResponse {
    pub message: String,
    pub id: i64,
}

/// Reduces a guest-supplied filename to a safe object-key segment.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]`
/// become `_`, leading dots are stripped.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return "upload".to_string();
    }

    if cleaned.len() > MAX_FILENAME_LEN {
        // Keep the tail so the extension survives.
        cleaned[cleaned.len() - MAX_FILENAME_LEN..].to_string()
    } else {
        cleaned.to_string()
    }
}

/// Object key for an uploaded file: `events/{eventId}/{timestampMillis}-{filename}`.
pub fn storage_path(event_id: Uuid, timestamp_millis: i64, filename: &str) -> String {
    format!(
        "events/{}/{}-{}",
        event_id,
        timestamp_millis,
        sanitize_filename(filename)
    )
}
