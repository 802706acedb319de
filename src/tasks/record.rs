use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest title kept, in characters. Longer input is silently cut.
pub const MAX_TITLE_CHARS: usize = 200;

/// A captured task. Immutable once created.
///
/// Serialized as one JSON object per log line:
/// `{"id":"<uuid>","title":"...","createdAt":"2024-05-01T10:00:00+02:00"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    id: Uuid,
    title: String,
    created_at: DateTime<FixedOffset>,
}

impl TaskRecord {
    /// Create a record with a fresh identity
    pub fn new(title: impl Into<String>, created_at: DateTime<FixedOffset>) -> Self {
        Self::with_id(Uuid::new_v4(), title, created_at)
    }

    /// Create a record stamped with the local wall clock
    pub fn now(title: impl Into<String>) -> Self {
        Self::new(title, Local::now().fixed_offset())
    }

    pub fn with_id(id: Uuid, title: impl Into<String>, created_at: DateTime<FixedOffset>) -> Self {
        Self {
            id,
            title: title.into(),
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    /// A record loaded from disk is usable only with a real id and a title
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_nil() && !self.title.trim().is_empty()
    }
}

/// Trim, then cut to [`MAX_TITLE_CHARS`]. `None` when nothing is left.
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_TITLE_CHARS).collect())
}
