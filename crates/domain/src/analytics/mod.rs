//! Per-event view, share and conversion analytics.

mod aggregate;
mod viewer;

pub use aggregate::{AnalyticsDomainEvent, EventAnalytics};
pub use viewer::{DedupWindow, ViewRecord, ViewerKey};

use common::{DomainError, ErrorKind, Failure};
use thiserror::Error;

/// Errors that can occur while recording analytics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// Analytics must belong to an event.
    #[error("Event ID is required")]
    EventRequired,

    /// The viewer address did not parse.
    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),
}

impl AnalyticsError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

impl From<AnalyticsError> for Failure {
    fn from(err: AnalyticsError) -> Self {
        Failure::new(DomainError::new(err.kind(), err.to_string()))
    }
}
