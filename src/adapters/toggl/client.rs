//! Toggl Reports API v2 client
//!
//! Fetches the `details` report for one workspace, following pagination, and
//! maps HTTP failures onto [`SourceError`].

use super::models::{DetailsPage, ErrorBody};
use super::source::TimeReportSource;
use crate::config::TogglConfig;
use crate::domain::{ExternalRecord, Result, SourceError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Date format of the `since` / `until` query parameters
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// HTTP client for the Toggl Reports API
///
/// # Example
///
/// ```no_run
/// use toggl_ledger::adapters::toggl::{TimeReportSource, TogglClient};
/// use toggl_ledger::config::load_config;
/// use chrono::NaiveDate;
///
/// # async fn example() -> toggl_ledger::domain::Result<()> {
/// let config = load_config("toggl-ledger.toml")?;
/// let client = TogglClient::new(config.toggl)?;
///
/// let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let records = client.fetch(since, None, None).await?;
/// println!("{} records", records.len());
/// # Ok(())
/// # }
/// ```
pub struct TogglClient {
    client: Client,
    config: TogglConfig,
}

impl TogglClient {
    /// Builds a client with the configured timeout
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConnectionFailed`] if the HTTP client cannot be built.
    pub fn new(config: TogglConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SourceError::ConnectionFailed(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Endpoint of a report type, e.g. `{base_url}/v2/details`
    pub fn report_url(&self, report_type: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            report_type
        )
    }

    /// `Basic base64("{token}:api_token")`
    fn auth_header_value(&self) -> String {
        let credentials = format!("{}:api_token", self.config.api_token.expose_secret().as_ref());
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {encoded}")
    }

    async fn fetch_page(
        &self,
        url: &str,
        since: NaiveDate,
        until: Option<NaiveDate>,
        page: u32,
    ) -> Result<DetailsPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("user_agent", self.config.user_agent.clone()),
            ("workspace_id", self.config.workspace_id.clone()),
            ("since", since.format(QUERY_DATE_FORMAT).to_string()),
        ];
        if let Some(until) = until {
            query.push(("until", until.format(QUERY_DATE_FORMAT).to_string()));
        }
        query.push(("page", page.to_string()));

        tracing::debug!(url = %url, page = page, "Requesting report page");

        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header_value())
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(e.to_string())
                } else {
                    SourceError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body).into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
        let page: DetailsPage = serde_json::from_str(&body)
            .map_err(|e| SourceError::InvalidResponse(format!("Failed to decode report page: {e}")))?;
        Ok(page)
    }
}

/// Maps a non-success status onto the source error taxonomy
pub fn status_error(status: StatusCode, body: &str) -> SourceError {
    let message = ErrorBody::message_or(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SourceError::AuthenticationFailed(format!("{status}: {message}"))
        }
        StatusCode::TOO_MANY_REQUESTS => SourceError::ServerError {
            status: status.as_u16(),
            message,
        },
        s if s.is_client_error() => SourceError::ClientError {
            status: s.as_u16(),
            message,
        },
        s => SourceError::ServerError {
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl TimeReportSource for TogglClient {
    async fn fetch(
        &self,
        since: NaiveDate,
        until: Option<NaiveDate>,
        report_type: Option<&str>,
    ) -> Result<Vec<ExternalRecord>> {
        let report_type = report_type.unwrap_or(&self.config.report_type);
        let url = self.report_url(report_type);

        tracing::info!(
            workspace_id = %self.config.workspace_id,
            report_type = report_type,
            since = %since,
            until = ?until,
            "Fetching Toggl report"
        );

        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let body = self.fetch_page(&url, since, until, page).await?;
            let page_count = body.page_count();

            let data = match body.data {
                Some(data) => data,
                None if page == 1 => {
                    return Err(SourceError::NoDataFetched(
                        "Empty data in report response".to_string(),
                    )
                    .into())
                }
                None => break,
            };

            let fetched = data.len();
            records.extend(data);

            if fetched == 0 || u64::from(page) >= page_count {
                break;
            }
            if page >= self.config.max_pages {
                tracing::warn!(
                    max_pages = self.config.max_pages,
                    total_count = body.total_count,
                    fetched = records.len(),
                    "Stopped paging at max_pages; remaining records are left for the next run"
                );
                break;
            }
            page += 1;
        }

        tracing::info!(records = records.len(), pages = page, "Fetched Toggl report");
        Ok(records)
    }
}
