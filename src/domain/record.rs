//! Time-tracking records as delivered by the report source

use serde::{Deserialize, Deserializer, Serialize};

/// One time entry from the remote report
///
/// Timestamps are kept exactly as observed; they are parsed by the
/// reconciler so that a bad value only affects its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// Identifier, unique per record
    pub id: u64,

    /// Free-text description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Start of the entry (RFC 3339)
    pub start: String,

    /// End of the entry (RFC 3339); absent while a timer is running
    #[serde(default)]
    pub end: Option<String>,

    /// Last-modified timestamp (RFC 3339)
    pub updated: String,

    /// Project label
    #[serde(default)]
    pub project: Option<String>,

    /// Tags attached to the entry
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl ExternalRecord {
    /// Creates a record with the mandatory fields; start defaults to `updated`
    pub fn new(id: u64, updated: impl Into<String>) -> Self {
        let updated = updated.into();
        Self {
            id,
            description: String::new(),
            start: updated.clone(),
            end: None,
            updated,
            project: None,
            tags: Vec::new(),
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the start timestamp
    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    /// Sets the end timestamp
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Sets the project label
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Sets the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Tags flattened to the comma-joined cell value
    pub fn tag_cell(&self) -> String {
        self.tags.join(",")
    }
}

/// Reads an explicit `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
