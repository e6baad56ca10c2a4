//! Toggl Reports API adapter
//!
//! [`TogglClient`] implements [`TimeReportSource`] over the v2 `details`
//! report. The trait is the seam the sync job depends on, so tests can supply
//! records without HTTP.

pub mod client;
pub mod models;
pub mod source;

pub use client::TogglClient;
pub use models::DetailsPage;
pub use source::TimeReportSource;
