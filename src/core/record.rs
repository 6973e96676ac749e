use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier for a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh identifier. The store calls this on insert.
    pub fn new() -> Self {
        RecordId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One document to be inserted within a transaction.
///
/// Absent and zero-valued optional fields are omitted from the persisted
/// form; the store never sees explicit nulls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRecord {
    /// Parent collection/container linkage, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podcast: Option<RecordId>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "duration_is_zero")]
    pub duration: i64,
}

fn duration_is_zero(duration: &i64) -> bool {
    *duration == 0
}

impl WriteRecord {
    pub fn new(title: impl Into<String>, duration: i64) -> Self {
        Self {
            podcast: None,
            title: title.into(),
            description: None,
            duration,
        }
    }

    /// Set the parent linkage.
    pub fn podcast(mut self, podcast: RecordId) -> Self {
        self.podcast = Some(podcast);
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of one successful write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// Identifier the store assigned to the inserted record.
    pub id: RecordId,
}
