use std::fmt;
use std::str::FromStr;

use crate::error::CotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportType {
    TradersInFinancialFuturesFut,
    TradersInFinancialFuturesFutopt,
    DisaggregatedFut,
    DisaggregatedFutopt,
    LegacyFut,
    LegacyFutopt,
    SupplementalFutopt,
}

impl ReportType {
    pub const ALL: [ReportType; 7] = [
        ReportType::TradersInFinancialFuturesFut,
        ReportType::TradersInFinancialFuturesFutopt,
        ReportType::DisaggregatedFut,
        ReportType::DisaggregatedFutopt,
        ReportType::LegacyFut,
        ReportType::LegacyFutopt,
        ReportType::SupplementalFutopt,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ReportType::TradersInFinancialFuturesFut => "traders_in_financial_futures_fut",
            ReportType::TradersInFinancialFuturesFutopt => "traders_in_financial_futures_futopt",
            ReportType::DisaggregatedFut => "disaggregated_fut",
            ReportType::DisaggregatedFutopt => "disaggregated_futopt",
            ReportType::LegacyFut => "legacy_fut",
            ReportType::LegacyFutopt => "legacy_futopt",
            ReportType::SupplementalFutopt => "supplemental_futopt",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ReportType {
    type Err = CotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ReportType::ALL
            .into_iter()
            .find(|report_type| report_type.key() == normalized)
            .ok_or_else(|| CotError::UnknownReportType(value.to_string()))
    }
}

/// What a single archive request points at: one publication year or the
/// historical multi-year bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveTarget {
    Year(i32),
    Bundle,
}

impl fmt::Display for ArchiveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveTarget::Year(year) => write!(f, "{year}"),
            ArchiveTarget::Bundle => write!(f, "bundle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetrievalRequest {
    pub report_type: ReportType,
    pub target: ArchiveTarget,
}

impl RetrievalRequest {
    pub fn year(report_type: ReportType, year: i32) -> Self {
        Self {
            report_type,
            target: ArchiveTarget::Year(year),
        }
    }

    pub fn bundle(report_type: ReportType) -> Self {
        Self {
            report_type,
            target: ArchiveTarget::Bundle,
        }
    }

    pub fn targets_year(&self, year: i32) -> bool {
        self.target == ArchiveTarget::Year(year)
    }
}

impl fmt::Display for RetrievalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.report_type, self.target)
    }
}

/// Parses `<report_type>:<year>` or `<report_type>:bundle`.
impl FromStr for RetrievalRequest {
    type Err = CotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (kind, rest) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| CotError::InvalidRequest(value.to_string()))?;
        let report_type: ReportType = kind.parse()?;
        match rest.trim() {
            "bundle" => Ok(RetrievalRequest::bundle(report_type)),
            year => {
                let year =
                    parse_year(year).ok_or_else(|| CotError::InvalidRequest(value.to_string()))?;
                Ok(RetrievalRequest::year(report_type, year))
            }
        }
    }
}

fn parse_year(value: &str) -> Option<i32> {
    if value.len() != 4 || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
