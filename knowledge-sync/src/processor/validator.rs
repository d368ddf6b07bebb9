//! Event validation.
//!
//! Validation failures are producer data problems. They are reported as a
//! [`ValidationError`], never as an [`IngestError`](crate::errors::IngestError), so they can
//! not be mistaken for a downstream failure.

use chrono::{DateTime, NaiveDateTime, Utc};
use knowledge_sync_repository::utils::MAX_DOCUMENT_ID_BYTES;
use knowledge_sync_shared::DocumentEvent;
use thiserror::Error;
use url::Url;

/// Why an event was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid document id: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Expiring event is missing {0}")]
    MissingValidityBound(&'static str),

    #[error("Invalid timestamp in {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Outside validity window [{valid_from}, {valid_until}]")]
    OutsideValidityWindow {
        valid_from: String,
        valid_until: String,
    },
}

/// Stateless business-rule checks, applied in order and short-circuiting on the first
/// failure:
///
/// 1. `id`, `title`, `url`, `timestamp` and `version` are present and non-empty
/// 2. `id` is usable as an index document id as-is
/// 3. `url` is an absolute `http`/`https` URL with a host
/// 4. if `can_expire`, both validity bounds parse and the current time lies inside them
#[derive(Debug, Clone, Copy, Default)]
pub struct EventValidator;

impl EventValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate against the current wall-clock time.
    pub fn validate(&self, event: &DocumentEvent) -> Result<(), ValidationError> {
        self.validate_at(event, Utc::now())
    }

    /// Validate as of `now`.
    pub fn validate_at(
        &self,
        event: &DocumentEvent,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        Self::check_required_fields(event)?;
        Self::check_document_id(&event.id)?;
        Self::check_url(&event.url)?;
        if event.can_expire {
            Self::check_validity_window(event, now)?;
        }
        Ok(())
    }

    fn check_required_fields(event: &DocumentEvent) -> Result<(), ValidationError> {
        let text_fields = [
            ("id", &event.id),
            ("title", &event.title),
            ("url", &event.url),
            ("timestamp", &event.timestamp),
        ];
        for (name, value) in text_fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        if event.version.is_none() {
            return Err(ValidationError::MissingField("version"));
        }
        Ok(())
    }

    /// The id is fingerprinted and indexed verbatim, so it must already be in the form the
    /// index accepts.
    fn check_document_id(id: &str) -> Result<(), ValidationError> {
        if id.trim() != id {
            return Err(ValidationError::InvalidId(format!(
                "{:?} has surrounding whitespace",
                id
            )));
        }
        if id.len() > MAX_DOCUMENT_ID_BYTES {
            return Err(ValidationError::InvalidId(format!(
                "{} bytes, maximum is {}",
                id.len(),
                MAX_DOCUMENT_ID_BYTES
            )));
        }
        Ok(())
    }

    fn check_url(raw: &str) -> Result<(), ValidationError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                raw,
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ValidationError::InvalidUrl(format!("{}: missing host", raw)));
        }
        Ok(())
    }

    fn check_validity_window(
        event: &DocumentEvent,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let raw_from = event
            .valid_from
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ValidationError::MissingValidityBound("validFrom"))?;
        let raw_until = event
            .valid_until
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ValidationError::MissingValidityBound("validUntil"))?;

        let valid_from = parse_timestamp(raw_from).ok_or_else(|| {
            ValidationError::InvalidTimestamp {
                field: "validFrom",
                value: raw_from.to_string(),
            }
        })?;
        let valid_until = parse_timestamp(raw_until).ok_or_else(|| {
            ValidationError::InvalidTimestamp {
                field: "validUntil",
                value: raw_until.to_string(),
            }
        })?;

        if now < valid_from || now > valid_until {
            return Err(ValidationError::OutsideValidityWindow {
                valid_from: raw_from.to_string(),
                valid_until: raw_until.to_string(),
            });
        }
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use knowledge_sync_shared::EventKind;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn valid_event() -> DocumentEvent {
        DocumentEvent::new(
            "doc-1",
            EventKind::Created,
            "Onboarding guide",
            "https://kb.example.com/onboarding",
            1,
            "2026-06-01T11:59:00Z",
        )
        .with_should_index(true)
    }

    fn rfc3339(at: DateTime<Utc>) -> Option<String> {
        Some(at.to_rfc3339())
    }

    #[test]
    fn test_valid_event_passes() {
        assert_eq!(EventValidator::new().validate_at(&valid_event(), now()), Ok(()));
    }

    #[test]
    fn test_required_fields_in_order() {
        let validator = EventValidator::new();

        let mut event = valid_event();
        event.id = "  ".to_string();
        event.title = String::new();
        assert_eq!(
            validator.validate_at(&event, now()),
            Err(ValidationError::MissingField("id"))
        );

        let mut event = valid_event();
        event.title = String::new();
        assert_eq!(
            validator.validate_at(&event, now()),
            Err(ValidationError::MissingField("title"))
        );

        let mut event = valid_event();
        event.timestamp = String::new();
        assert_eq!(
            validator.validate_at(&event, now()),
            Err(ValidationError::MissingField("timestamp"))
        );

        let mut event = valid_event();
        event.version = None;
        assert_eq!(
            validator.validate_at(&event, now()),
            Err(ValidationError::MissingField("version"))
        );
    }

    #[test]
    fn test_document_id_must_be_indexable() {
        let validator = EventValidator::new();

        let mut event = valid_event();
        event.id = "x".repeat(MAX_DOCUMENT_ID_BYTES + 1);
        event.url = "not a url".to_string();
        assert!(matches!(
            validator.validate_at(&event, now()),
            Err(ValidationError::InvalidId(_))
        ));

        let mut event = valid_event();
        event.id = "x".repeat(MAX_DOCUMENT_ID_BYTES);
        assert_eq!(validator.validate_at(&event, now()), Ok(()));

        for id in [" doc-1", "doc-1 ", "doc-1\n"] {
            let mut event = valid_event();
            event.id = id.to_string();
            assert!(
                matches!(
                    validator.validate_at(&event, now()),
                    Err(ValidationError::InvalidId(_))
                ),
                "expected {:?} to be rejected",
                id
            );
        }
    }

    #[test]
    fn test_url_must_be_http() {
        let validator = EventValidator::new();
        for url in [
            "kb.example.com/onboarding",
            "ftp://kb.example.com/file",
            "mailto:someone@example.com",
            "https://",
            "not a url",
        ] {
            let mut event = valid_event();
            event.url = url.to_string();
            assert!(
                matches!(
                    validator.validate_at(&event, now()),
                    Err(ValidationError::InvalidUrl(_))
                ),
                "expected {} to be rejected",
                url
            );
        }

        let mut event = valid_event();
        event.url = "http://localhost:8080/doc".to_string();
        assert_eq!(validator.validate_at(&event, now()), Ok(()));
    }

    #[test]
    fn test_future_window_is_rejected_until_it_opens() {
        let validator = EventValidator::new();
        let event = valid_event().with_validity(
            rfc3339(now() + Duration::hours(1)),
            rfc3339(now() + Duration::hours(2)),
        );

        assert!(matches!(
            validator.validate_at(&event, now()),
            Err(ValidationError::OutsideValidityWindow { .. })
        ));
        assert_eq!(
            validator.validate_at(&event, now() + Duration::minutes(90)),
            Ok(())
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let validator = EventValidator::new();
        let event = valid_event().with_validity(rfc3339(now()), rfc3339(now() + Duration::hours(1)));

        assert_eq!(validator.validate_at(&event, now()), Ok(()));
        assert_eq!(
            validator.validate_at(&event, now() + Duration::hours(1)),
            Ok(())
        );
        assert!(validator
            .validate_at(&event, now() + Duration::hours(1) + Duration::seconds(1))
            .is_err());
    }

    #[test]
    fn test_expiring_event_needs_both_bounds() {
        let validator = EventValidator::new();

        let event = valid_event().with_validity(rfc3339(now()), None);
        assert_eq!(
            validator.validate_at(&event, now()),
            Err(ValidationError::MissingValidityBound("validUntil"))
        );

        let event = valid_event().with_validity(None, rfc3339(now()));
        assert_eq!(
            validator.validate_at(&event, now()),
            Err(ValidationError::MissingValidityBound("validFrom"))
        );

        let event = valid_event().with_validity(Some("yesterday".to_string()), rfc3339(now()));
        assert!(matches!(
            validator.validate_at(&event, now()),
            Err(ValidationError::InvalidTimestamp { field: "validFrom", .. })
        ));
    }

    #[test]
    fn test_bounds_ignored_when_not_expiring() {
        let mut event = valid_event();
        event.valid_from = Some("garbage".to_string());
        assert_eq!(EventValidator::new().validate_at(&event, now()), Ok(()));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-06-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-06-01T14:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-06-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-06-01T12:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("06/01/2026"), None);
    }
}
