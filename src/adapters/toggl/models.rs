//! Toggl Reports API v2 payloads

use crate::domain::ExternalRecord;
use serde::Deserialize;

/// One page of the `details` report
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsPage {
    /// Entries matching the query across all pages
    #[serde(default)]
    pub total_count: u64,

    /// Page size chosen by the server
    #[serde(default)]
    pub per_page: u64,

    /// Entries on this page; absent when the report could not be built
    #[serde(default)]
    pub data: Option<Vec<ExternalRecord>>,
}

impl DetailsPage {
    /// Number of pages needed for `total_count`, at least 1
    pub fn page_count(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total_count.div_ceil(self.per_page).max(1)
    }
}

/// Error body returned alongside 4xx/5xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub tip: Option<String>,
}

impl ErrorBody {
    /// Human readable message, falling back to the raw body
    pub fn message_or(raw: &str) -> String {
        serde_json::from_str::<ErrorBody>(raw)
            .ok()
            .and_then(|body| body.error)
            .map(|detail| match detail.tip {
                Some(tip) if !tip.is_empty() => format!("{} ({tip})", detail.message),
                _ => detail.message,
            })
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| raw.trim().to_string())
    }
}
