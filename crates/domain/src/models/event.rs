//! Event domain models.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::memory::Memory;
use super::tier::Tier;

/// Default lifetime of an event before guests can no longer upload.
pub const DEFAULT_EVENT_LIFETIME_DAYS: i64 = 30;

/// Length of the random suffix appended to event slugs.
pub const SLUG_SUFFIX_LEN: usize = 4;

/// Kind of gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Wedding,
    Baptism,
    Party,
    #[default]
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Wedding => "wedding",
            EventCategory::Baptism => "baptism",
            EventCategory::Party => "party",
            EventCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wedding" => Ok(EventCategory::Wedding),
            "baptism" => Ok(EventCategory::Baptism),
            "party" => Ok(EventCategory::Party),
            "other" => Ok(EventCategory::Other),
            _ => Err(format!("Invalid event category: {}", s)),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A gathering owned by a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub cover_image: Option<String>,
    pub welcome_message: Option<String>,
    pub spotify_url: Option<String>,
    pub slug: String,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub category: EventCategory,
    pub package: Tier,
    pub storage_used: i64,
    pub is_expired: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// An event is expired once flagged or once `expires_at` has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired || now > self.expires_at
    }

    pub fn is_expired_now(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Computes the expiry of an event created at `created_at`.
pub fn expiry_from(created_at: DateTime<Utc>, lifetime_days: i64) -> DateTime<Utc> {
    created_at + Duration::days(lifetime_days)
}

/// Request payload for creating an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: String,

    #[serde(deserialize_with = "deserialize_event_date")]
    pub date: DateTime<Utc>,

    #[serde(default)]
    pub category: EventCategory,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 2048, message = "Cover image reference is too long"))]
    pub cover_image: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = 1000, message = "Welcome message must be at most 1000 characters"))]
    pub welcome_message: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(custom(function = "shared::validation::validate_http_url"))]
    pub spotify_url: Option<String>,
}

/// Public view of an event returned to guests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEventResponse {
    pub id: Uuid,
    pub title: String,
    pub welcome_message: Option<String>,
    pub cover_image: Option<String>,
    pub date: DateTime<Utc>,
    pub spotify_url: Option<String>,
    pub category: EventCategory,
}

impl From<Event> for PublicEventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            welcome_message: event.welcome_message,
            cover_image: event.cover_image,
            date: event.date,
            spotify_url: event.spotify_url,
            category: event.category,
        }
    }
}

/// Event with its memories eagerly loaded, used by the host dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithMemories {
    #[serde(flatten)]
    pub event: Event,
    pub memories: Vec<Memory>,
}

/// Response for event deletion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventResponse {
    pub message: String,
    pub deleted_memories: u64,
}

/// Lowercases `title`, collapses every run of non-alphanumerics into a
/// single hyphen and trims edge hyphens. Falls back to `event` when nothing
/// alphanumeric remains.
pub fn slug_base(title: &str) -> String {
    let lowered = title.to_lowercase();
    let base = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let base = base.trim_matches('-');
    if base.is_empty() {
        "event".to_string()
    } else {
        base.to_string()
    }
}

/// Generates a shareable slug: `{slug_base}-{4 random alphanumerics}`.
pub fn generate_slug(title: &str) -> String {
    format!(
        "{}-{}",
        slug_base(title),
        shared::crypto::random_lowercase_alphanumeric(SLUG_SUFFIX_LEN)
    )
}

/// Accepts either a plain calendar date (`2026-06-12`, taken as midnight UTC)
/// or an RFC 3339 timestamp.
fn deserialize_event_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD or RFC 3339", raw))
    })
}

pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

lazy_static::lazy_static! {
    static ref NON_SLUG_CHARS: regex::Regex = regex::Regex::new(r"[^a-z0-9]+").unwrap();
    /// Shape of a generated slug.
    pub static ref SLUG_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*-[a-z0-9]{4}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> Event {
        let created = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        Event {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: "Anna & Nikos".to_string(),
            date: created,
            cover_image: None,
            welcome_message: Some("Welcome!".to_string()),
            spotify_url: None,
            slug: "anna-nikos-ab12".to_string(),
            password: Some("secret".to_string()),
            category: EventCategory::Wedding,
            package: Tier::Basic,
            storage_used: 0,
            is_expired: false,
            expires_at: expiry_from(created, DEFAULT_EVENT_LIFETIME_DAYS),
            created_at: created,
        }
    }

    #[test]
    fn test_slug_base() {
        assert_eq!(slug_base("Anna & Nikos Wedding!"), "anna-nikos-wedding");
        assert_eq!(slug_base("  --Party 2026--  "), "party-2026");
        assert_eq!(slug_base("A__B"), "a-b");
        assert_eq!(slug_base("!!!"), "event");
        assert_eq!(slug_base(""), "event");
    }

    #[test]
    fn test_slug_base_drops_non_ascii_letters() {
        assert_eq!(slug_base("Γάμος Maria"), "maria");
        assert_eq!(slug_base("Βάπτιση"), "event");
    }

    #[test]
    fn test_generate_slug_shape() {
        let slug = generate_slug("Summer Party");
        assert!(slug.starts_with("summer-party-"));
        assert_eq!(slug.len(), "summer-party-".len() + SLUG_SUFFIX_LEN);
        assert!(SLUG_REGEX.is_match(&slug));
    }

    #[test]
    fn test_generate_slug_varies() {
        let slugs: std::collections::HashSet<String> =
            (0..20).map(|_| generate_slug("Same Title")).collect();
        assert!(slugs.len() > 1);
    }

    #[test]
    fn test_expiry_from() {
        let created = Utc.with_ymd_and_hms(2026, 1, 31, 8, 0, 0).unwrap();
        let expires = expiry_from(created, 30);
        assert_eq!(expires, Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_is_expired_by_flag() {
        let mut event = sample_event();
        event.is_expired = true;
        assert!(event.is_expired_at(event.created_at));
    }

    #[test]
    fn test_is_expired_by_time() {
        let event = sample_event();
        assert!(!event.is_expired_at(event.expires_at));
        assert!(event.is_expired_at(event.expires_at + Duration::seconds(1)));
        assert!(!event.is_expired_at(event.created_at));
    }

    #[test]
    fn test_event_serialization_hides_password() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["package"], "BASIC");
        assert_eq!(json["category"], "wedding");
        assert_eq!(json["storageUsed"], 0);
        assert!(json.get("expiresAt").is_some());
    }

    #[test]
    fn test_public_event_response() {
        let event = sample_event();
        let id = event.id;
        let public: PublicEventResponse = event.into();
        assert_eq!(public.id, id);
        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["welcomeMessage"], "Welcome!");
        assert!(json.get("slug").is_none());
        assert!(json.get("storageUsed").is_none());
    }

    #[test]
    fn test_event_with_memories_flattens() {
        let with = EventWithMemories {
            event: sample_event(),
            memories: vec![],
        };
        let json = serde_json::to_value(&with).unwrap();
        assert_eq!(json["title"], "Anna & Nikos");
        assert!(json["memories"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_request_accepts_plain_date() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title":"Wedding","date":"2026-06-12","category":"wedding"}"#,
        )
        .unwrap();
        assert_eq!(req.date, Utc.with_ymd_and_hms(2026, 6, 12, 0, 0, 0).unwrap());
        assert_eq!(req.category, EventCategory::Wedding);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_accepts_rfc3339() {
        let req: CreateEventRequest =
            serde_json::from_str(r#"{"title":"Party","date":"2026-06-12T18:30:00+02:00"}"#)
                .unwrap();
        assert_eq!(req.date, Utc.with_ymd_and_hms(2026, 6, 12, 16, 30, 0).unwrap());
        assert_eq!(req.category, EventCategory::Other);
    }

    #[test]
    fn test_create_request_rejects_bad_date() {
        let result: Result<CreateEventRequest, _> =
            serde_json::from_str(r#"{"title":"Party","date":"next friday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_request_rejects_unknown_category() {
        let result: Result<CreateEventRequest, _> =
            serde_json::from_str(r#"{"title":"Party","date":"2026-06-12","category":"funeral"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_request_blank_title_invalid() {
        let req: CreateEventRequest =
            serde_json::from_str(r#"{"title":"   ","date":"2026-06-12"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateEventRequest =
            serde_json::from_str(r#"{"title":"","date":"2026-06-12"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_empty_optionals_become_none() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title":"Party","date":"2026-06-12","coverImage":"","spotifyUrl":" "}"#,
        )
        .unwrap();
        assert!(req.cover_image.is_none());
        assert!(req.spotify_url.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_bad_music_link() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title":"Party","date":"2026-06-12","spotifyUrl":"spotify:playlist:1"}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(EventCategory::parse("BAPTISM"), Some(EventCategory::Baptism));
        assert_eq!(EventCategory::parse("gala"), None);
    }

    #[test]
    fn test_generated_slugs_match_pattern_for_random_titles() {
        use fake::faker::lorem::en::Sentence;
        use fake::Fake;

        for _ in 0..50 {
            let title: String = Sentence(1..8).fake();
            let slug = generate_slug(&title);
            assert!(SLUG_REGEX.is_match(&slug), "{} -> {}", title, slug);
        }
    }
}
