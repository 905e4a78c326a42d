//! Guest-facing event endpoints.
//!
//! Unauthenticated; every request is scoped to one event by its slug.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    memory::storage_path, Memory, MemoryType, NewMemory, PublicEventResponse,
    UploadMemoryResponse,
};
use domain::services::{
    quota::check_upload, rewrite_or_original, ImageInput, QuotaViolation, StoryInput,
};
use persistence::repositories::{EventRepository, InsertMemoryError, MemoryRepository};
use tracing::{info, warn};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{
    record_ai_fallback, record_memory_uploaded, record_storage_delete_failure,
    record_upload_rejected,
};

const FILE_FIELD: &str = "photo";
const CAPTION_FIELD: &str = "memory";
const UPLOAD_SUCCESS_MESSAGE: &str = "Memory captured successfully!";

/// File part of an upload form.
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Parsed upload form.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    caption: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&filename)
                            .first_or_octet_stream()
                            .to_string()
                    });
                let bytes = field.bytes().await?.to_vec();
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes,
                });
            }
            Some(CAPTION_FIELD) => {
                let text = field.text().await?;
                let text = text.trim();
                if !text.is_empty() {
                    form.caption = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Get the public view of an event.
///
/// GET /api/events/:slug
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicEventResponse>, ApiError> {
    let event = EventRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .map(domain::models::Event::from)
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    if event.is_expired_now() {
        return Err(ApiError::Forbidden("Event has expired".into()));
    }

    Ok(Json(event.into()))
}

/// Most recent approved memories of an event.
///
/// GET /api/events/:slug/memories
pub async fn get_gallery(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    let event = EventRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    let memories = MemoryRepository::new(state.pool.clone())
        .list_approved_by_event(event.id, state.config.limits.public_gallery_limit)
        .await?
        .into_iter()
        .map(Memory::from)
        .collect();

    Ok(Json(memories))
}

/// Accept a guest photo or video with an optional caption.
///
/// POST /api/events/:slug/upload
pub async fn upload_memory(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadMemoryResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;

    let Some(file) = form.file.filter(|f| !f.bytes.is_empty()) else {
        record_upload_rejected("missing_file");
        return Err(ApiError::Validation("No photo uploaded".into()));
    };
    let file_size = file.bytes.len() as i64;

    let event_repo = EventRepository::new(state.pool.clone());
    let event = event_repo
        .find_by_slug(&slug)
        .await?
        .map(domain::models::Event::from)
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    if event.is_expired_now() {
        record_upload_rejected("expired");
        return Err(ApiError::Forbidden(
            "This event has expired. No new memories can be added.".into(),
        ));
    }

    let memory_repo = MemoryRepository::new(state.pool.clone());
    let memory_count = memory_repo.count_by_event(event.id).await?;
    if let Err(violation) = check_upload(event.package, memory_count, event.storage_used, file_size)
    {
        return Err(reject_quota(&slug, violation));
    }

    let path = storage_path(event.id, Utc::now().timestamp_millis(), &file.filename);
    let locator = state
        .storage
        .upload_file(&file.bytes, &file.content_type, &path)
        .await?;

    let image = file
        .content_type
        .starts_with("image/")
        .then_some(ImageInput {
            bytes: &file.bytes,
            mime_type: &file.content_type,
        });
    let caption = form.caption.as_deref().unwrap_or_default();
    let story = if caption.is_empty() && image.is_none() {
        String::new()
    } else {
        let outcome = rewrite_or_original(
            state.story_writer.as_ref(),
            StoryInput {
                text: caption,
                image,
            },
        )
        .await;
        if outcome.fell_back && state.config.ai.enabled {
            record_ai_fallback();
        }
        outcome.story
    };

    let new_memory = NewMemory {
        event_id: event.id,
        memory_type: MemoryType::from_content_type(&file.content_type),
        storage_path: locator.clone(),
        original_text: form.caption.clone(),
        ai_story: (!story.is_empty()).then(|| story.clone()),
        file_size,
    };

    let memory = match memory_repo.insert_with_quota(&new_memory).await {
        Ok(memory) => memory,
        Err(err) => {
            discard_blob(&state, &locator).await;
            return Err(match err {
                InsertMemoryError::Quota(violation) => reject_quota(&slug, violation),
                other => other.into(),
            });
        }
    };

    record_memory_uploaded(file.bytes.len());
    info!(
        slug = %slug,
        event_id = %event.id,
        memory_id = memory.id,
        size = file_size,
        memory_type = %new_memory.memory_type,
        "Memory uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadMemoryResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            story,
        }),
    ))
}

fn reject_quota(slug: &str, violation: QuotaViolation) -> ApiError {
    info!(slug = %slug, reason = violation.reason(), "Upload rejected by quota");
    record_upload_rejected(violation.reason());
    violation.into()
}

/// Removes a blob whose memory row was never written.
async fn discard_blob(state: &AppState, locator: &str) {
    if let Err(e) = state.storage.delete_file(locator).await {
        record_storage_delete_failure();
        warn!(locator = %locator, error = %e, "Failed to remove orphaned upload");
    }
}
