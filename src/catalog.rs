//! Naming rules for every published COT report family.
//!
//! The publisher has renamed its archives more than once: the legacy
//! reports still use the short `deacot`/`deahistfo` prefixes while the
//! newer families spell out `fut_`/`com_` variants. This table is the only
//! place that knows about it.

use crate::domain::ReportType;
use crate::error::CotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTypeSpec {
    pub report_type: ReportType,
    /// Year archives are `<prefix><yyyy>.zip`.
    pub year_file_prefix: &'static str,
    /// Multi-year historical archive, when one was published.
    pub bundle_filename: Option<&'static str>,
    pub description: &'static str,
}

impl ReportTypeSpec {
    pub fn year_filename(&self, year: i32) -> String {
        format!("{}{year}.zip", self.year_file_prefix)
    }
}

static CATALOG: [ReportTypeSpec; 7] = [
    ReportTypeSpec {
        report_type: ReportType::TradersInFinancialFuturesFut,
        year_file_prefix: "fut_fin_txt_",
        bundle_filename: Some("fin_fut_txt_2006_2016.zip"),
        description: "Traders in Financial Futures, futures only",
    },
    ReportTypeSpec {
        report_type: ReportType::TradersInFinancialFuturesFutopt,
        year_file_prefix: "com_fin_txt_",
        bundle_filename: Some("fin_com_txt_2006_2016.zip"),
        description: "Traders in Financial Futures, futures and options combined",
    },
    ReportTypeSpec {
        report_type: ReportType::DisaggregatedFut,
        year_file_prefix: "fut_disagg_txt_",
        bundle_filename: Some("fut_disagg_txt_hist_2006_2016.zip"),
        description: "Disaggregated, futures only",
    },
    ReportTypeSpec {
        report_type: ReportType::DisaggregatedFutopt,
        year_file_prefix: "com_disagg_txt_",
        bundle_filename: Some("com_disagg_txt_hist_2006_2016.zip"),
        description: "Disaggregated, futures and options combined",
    },
    ReportTypeSpec {
        report_type: ReportType::LegacyFut,
        year_file_prefix: "deacot",
        bundle_filename: Some("deacot1986_2016.zip"),
        description: "Legacy, futures only",
    },
    ReportTypeSpec {
        report_type: ReportType::LegacyFutopt,
        year_file_prefix: "deahistfo",
        bundle_filename: Some("deahistfo_1995_2016.zip"),
        description: "Legacy, futures and options combined",
    },
    ReportTypeSpec {
        report_type: ReportType::SupplementalFutopt,
        year_file_prefix: "dea_cit_txt_",
        bundle_filename: Some("dea_cit_txt_2006_2016.zip"),
        description: "Supplemental commodity index traders, futures and options combined",
    },
];

pub fn entries() -> &'static [ReportTypeSpec] {
    &CATALOG
}

pub fn spec_for(report_type: ReportType) -> &'static ReportTypeSpec {
    // CATALOG is ordered like ReportType::ALL; checked in tests.
    &CATALOG[report_type as usize]
}

pub fn lookup(key: &str) -> Result<&'static ReportTypeSpec, CotError> {
    let report_type: ReportType = key.parse()?;
    Ok(spec_for(report_type))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn catalog_order_matches_enum() {
        for (index, report_type) in ReportType::ALL.into_iter().enumerate() {
            assert_eq!(CATALOG[index].report_type, report_type);
            assert_eq!(spec_for(report_type).report_type, report_type);
        }
    }

    #[test]
    fn lookup_known_key() {
        let spec = lookup("traders_in_financial_futures_fut").unwrap();
        assert_eq!(spec.year_file_prefix, "fut_fin_txt_");
        assert_eq!(spec.year_filename(2026), "fut_fin_txt_2026.zip");
    }

    #[test]
    fn lookup_legacy_uses_short_prefix() {
        let spec = lookup("legacy_fut").unwrap();
        assert_eq!(spec.year_filename(1999), "deacot1999.zip");
    }

    #[test]
    fn lookup_unknown_key() {
        let err = lookup("tff").unwrap_err();
        assert_matches!(err, CotError::UnknownReportType(_));
    }
}
