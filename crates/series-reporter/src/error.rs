use error_stack::Report;
use series_client::CommError;
use thiserror::Error;

use crate::expansion::Expansion;
use crate::resolver::ResolveError;

/// Invalid reporter configuration, raised when the reporter is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid collector URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported collector URL scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("Tag `{0}` is not of the form label:value")]
    InvalidTag(String),

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("`{expansion}` is not a {table} expansion")]
    InvalidExpansion {
        expansion: Expansion,
        table: &'static str,
    },

    #[error("Failed to create series client: {0}")]
    Client(Report<CommError>),
}

impl From<Report<CommError>> for ConfigError {
    fn from(report: Report<CommError>) -> Self {
        ConfigError::Client(report)
    }
}

/// Failure of a single reporting cycle. These never escape the reporter,
/// they are logged and the next cycle starts from scratch.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Cannot expand `{metric}` with `{expansion}`")]
    Expansion { metric: String, expansion: Expansion },

    #[error("Failed to publish series: {0}")]
    Publish(Report<CommError>),
}

impl From<Report<CommError>> for ReportError {
    fn from(report: Report<CommError>) -> Self {
        ReportError::Publish(report)
    }
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Reporting period must be greater than zero")]
    ZeroPeriod,

    #[error("Failed to spawn reporting thread: {0}")]
    Spawn(#[from] std::io::Error),
}
