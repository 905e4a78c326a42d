use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{IdentityError, QuotaViolation, StorageError};
use persistence::repositories::{CreateEventError, InsertMemoryError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {message}")]
    InvalidFields {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            ApiError::InvalidFields { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                Some(details),
            ),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg, None)
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
                None,
            ),
            ApiError::Internal(msg) => {
                // The cause goes to the log only; clients get a fixed message.
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::InvalidFields { message, details }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Upload exceeds the maximum allowed size".into())
        } else {
            ApiError::Validation(format!("Invalid multipart body: {}", err.body_text()))
        }
    }
}

impl From<QuotaViolation> for ApiError {
    fn from(violation: QuotaViolation) -> Self {
        ApiError::Forbidden(violation.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(format!("Storage error: {}", err))
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken => {
                ApiError::Unauthorized("Invalid or expired token".into())
            }
            IdentityError::Expired => ApiError::Unauthorized("Invalid or expired token".into()),
            IdentityError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Identity provider unavailable");
                ApiError::ServiceUnavailable("Authentication service unavailable".into())
            }
        }
    }
}

impl From<InsertMemoryError> for ApiError {
    fn from(err: InsertMemoryError) -> Self {
        match err {
            InsertMemoryError::EventNotFound => ApiError::NotFound("Event not found".into()),
            InsertMemoryError::Quota(violation) => violation.into(),
            InsertMemoryError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<CreateEventError> for ApiError {
    fn from(err: CreateEventError) -> Self {
        match err {
            CreateEventError::ProfileNotFound => {
                ApiError::NotFound("Profile not found. Please register first.".into())
            }
            CreateEventError::Quota(violation) => violation.into(),
            CreateEventError::Database(db_err) => db_err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Tier;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_statuses() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Forbidden("test".to_string())),
            "Forbidden: test"
        );
        assert_eq!(format!("{}", ApiError::RateLimited), "Rate limited");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response =
            ApiError::Internal("connection refused at 10.0.0.5:5432".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "An internal error occurred");
        assert!(json.get("stack").is_none());
        assert!(!json.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let json = body_json(ApiError::NotFound("Event not found".into()).into_response()).await;
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["message"], "Event not found");
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        match error {
            ApiError::NotFound(msg) => assert_eq!(msg, "Resource not found"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_from_quota_violation() {
        let error: ApiError = QuotaViolation::UploadLimit(Tier::Basic).into();
        match error {
            ApiError::Forbidden(msg) => assert_eq!(msg, "Upload limit reached for BASIC tier."),
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[test]
    fn test_from_insert_memory_error() {
        let error: ApiError = InsertMemoryError::EventNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));

        let error: ApiError =
            InsertMemoryError::Quota(QuotaViolation::StorageLimit(Tier::Vip)).into();
        assert!(matches!(error, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_from_create_event_error() {
        match ApiError::from(CreateEventError::ProfileNotFound) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Profile not found. Please register first."),
            _ => panic!("Expected NotFound error"),
        }

        let error: ApiError = CreateEventError::Quota(QuotaViolation::EventLimit(Tier::Basic, 1)).into();
        assert!(matches!(error, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_from_storage_error_is_internal() {
        let error: ApiError = StorageError::Http("timeout".into()).into();
        assert!(matches!(error, ApiError::Internal(_)));
    }

    #[test]
    fn test_from_identity_error() {
        let error: ApiError = IdentityError::Expired.into();
        assert!(matches!(error, ApiError::Unauthorized(_)));

        let error: ApiError = IdentityError::Unavailable("dns".into()).into();
        assert!(matches!(error, ApiError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_from_validation_errors_keeps_details() {
        use validator::Validate;

        let req: domain::models::CreateEventRequest =
            serde_json::from_str(r#"{"title":"","date":"2026-06-12"}"#).unwrap();
        let error: ApiError = req.validate().unwrap_err().into();
        match &error {
            ApiError::InvalidFields { message, details } => {
                assert!(!message.is_empty());
                assert!(details.iter().any(|d| d.field == "title"));
            }
            _ => panic!("Expected InvalidFields error"),
        }

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"][0]["field"], "title");
    }

    #[tokio::test]
    async fn test_plain_validation_has_no_details() {
        let json = body_json(ApiError::Validation("No photo uploaded".into()).into_response()).await;
        assert!(json.get("details").is_none());
    }
}
