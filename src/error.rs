use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::ReportType;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Resolve,
    Fetch,
    Decode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::Resolve => write!(f, "resolve"),
            Stage::Fetch => write!(f, "fetch"),
            Stage::Decode => write!(f, "decode"),
        }
    }
}

/// Transport-level outcome attached to a failed retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalStatus {
    Http(u16),
    TimedOut,
    Transport(String),
}

impl fmt::Display for RetrievalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStatus::Http(code) => write!(f, "HTTP status {code}"),
            RetrievalStatus::TimedOut => write!(f, "request timed out"),
            RetrievalStatus::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CotError {
    #[error("unknown report type '{0}' (try `cot types`)")]
    UnknownReportType(String),

    #[error("no historical bundle archive is published for report type {0}")]
    BundleUnavailable(ReportType),

    #[error("invalid year range: start year {start} is after end year {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("failed to retrieve {location}: {status}")]
    RetrievalFailed {
        location: String,
        status: RetrievalStatus,
    },

    #[error("archive could not be read: {reason}")]
    CorruptArchive { reason: String },

    #[error("no .txt/.csv data file found in archive; entries seen: {entries_seen:?}")]
    NoDataFileFound { entries_seen: Vec<String> },

    #[error("year {year} of the requested range failed")]
    RangeFetchFailed {
        year: i32,
        #[source]
        cause: Box<CotError>,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid request in config: {0}")]
    InvalidRequest(String),

    #[error("failed to write output: {0}")]
    Output(String),
}

impl CotError {
    pub fn stage(&self) -> Stage {
        match self {
            CotError::UnknownReportType(_)
            | CotError::BundleUnavailable(_)
            | CotError::InvalidYearRange { .. }
            | CotError::InvalidRequest(_) => Stage::Resolve,
            CotError::RetrievalFailed { .. } | CotError::Filesystem(_) => Stage::Fetch,
            CotError::CorruptArchive { .. } | CotError::NoDataFileFound { .. } => Stage::Decode,
            CotError::RangeFetchFailed { cause, .. } => cause.stage(),
            CotError::HttpClient(_)
            | CotError::ConfigRead(_)
            | CotError::ConfigParse(_)
            | CotError::Output(_) => Stage::Setup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_failure_reports_inner_stage() {
        let err = CotError::RangeFetchFailed {
            year: 2021,
            cause: Box::new(CotError::NoDataFileFound {
                entries_seen: vec!["logo.png".to_string()],
            }),
        };
        assert_eq!(err.stage(), Stage::Decode);
        assert_eq!(err.to_string(), "year 2021 of the requested range failed");
    }

    #[test]
    fn retrieval_failure_names_location_and_status() {
        let err = CotError::RetrievalFailed {
            location: "https://example.test/deacot2031.zip".to_string(),
            status: RetrievalStatus::Http(404),
        };
        assert_eq!(err.stage(), Stage::Fetch);
        assert_eq!(
            err.to_string(),
            "failed to retrieve https://example.test/deacot2031.zip: HTTP status 404"
        );
    }
}
