use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Hash field holding the display name.
pub const NAME_FIELD: &str = "name";
/// Hash field holding the RFC 3339 creation timestamp.
pub const SESSION_CREATED_FIELD: &str = "session_created";

/// Server-side session state for one session cookie.
///
/// Both fields are written once at login. A record whose `name` is empty while
/// the client still presents an authentication ticket means the store lost the
/// session (flush, restart) and the ticket must not be trusted on its own.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub name: Option<String>,
    pub session_created: Option<String>,
}

impl SessionRecord {
    pub fn new(name: &str, created: DateTime<Utc>) -> Self {
        Self {
            name: Some(name.to_string()),
            session_created: Some(created.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Creation time, or `None` when absent or unparsable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.session_created
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.session_created.is_none()
    }

    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(2);
        if let Some(name) = &self.name {
            fields.push((NAME_FIELD, name.clone()));
        }
        if let Some(created) = &self.session_created {
            fields.push((SESSION_CREATED_FIELD, created.clone()));
        }
        fields
    }

    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        Self {
            name: fields.remove(NAME_FIELD),
            session_created: fields.remove(SESSION_CREATED_FIELD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn created_timestamp_survives_field_encoding() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let record = SessionRecord::new("Ada", created);
        let restored = SessionRecord::from_fields(
            record
                .to_fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
        assert_eq!(restored, record);
        assert_eq!(restored.created_at(), Some(created));
    }

    #[test]
    fn garbage_timestamp_reads_as_absent() {
        let record = SessionRecord {
            name: Some("Ada".into()),
            session_created: Some("yesterday-ish".into()),
        };
        assert_eq!(record.created_at(), None);
        assert!(record.has_name());
    }

    #[test]
    fn empty_name_is_not_a_name() {
        let record = SessionRecord {
            name: Some(String::new()),
            session_created: None,
        };
        assert!(!record.has_name());
        assert!(!SessionRecord::default().has_name());
        assert!(SessionRecord::default().is_empty());
    }
}
