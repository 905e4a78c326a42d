//! Memory entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Memory, MemoryType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the memories table.
#[derive(Debug, Clone, FromRow)]
pub struct MemoryEntity {
    pub id: i64,
    pub event_id: Uuid,
    #[sqlx(rename = "type")]
    pub memory_type: String,
    pub storage_path: String,
    pub original_text: Option<String>,
    pub ai_story: Option<String>,
    pub is_approved: bool,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<MemoryEntity> for Memory {
    fn from(entity: MemoryEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            memory_type: MemoryType::parse(&entity.memory_type).unwrap_or_default(),
            storage_path: entity.storage_path,
            original_text: entity.original_text,
            ai_story: entity.ai_story,
            is_approved: entity.is_approved,
            file_size: entity.file_size,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_entity_conversion() {
        let entity = MemoryEntity {
            id: 42,
            event_id: Uuid::new_v4(),
            memory_type: "video".to_string(),
            storage_path: "events/x/1-clip.mp4".to_string(),
            original_text: Some("First dance".to_string()),
            ai_story: Some("They danced.".to_string()),
            is_approved: true,
            file_size: 1024,
            created_at: Utc::now(),
        };
        let memory: Memory = entity.into();
        assert_eq!(memory.id, 42);
        assert_eq!(memory.memory_type, MemoryType::Video);
        assert!(memory.is_approved);
    }
}
