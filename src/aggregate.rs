use tracing::{debug, warn};

use crate::error::CotError;
use crate::table::ReportTable;

/// Runs `per_year` for every year in `start..=end`, ascending, and stacks
/// the tables in that order.
///
/// All or nothing: the first failing year aborts the range with
/// `RangeFetchFailed` and the tables already built are dropped.
pub fn aggregate_years<F>(start: i32, end: i32, mut per_year: F) -> Result<ReportTable, CotError>
where
    F: FnMut(i32) -> Result<ReportTable, CotError>,
{
    if start > end {
        return Err(CotError::InvalidYearRange { start, end });
    }

    let mut combined = ReportTable::default();
    for year in start..=end {
        let table = per_year(year).map_err(|cause| {
            warn!(year, error = %cause, "year range aborted");
            CotError::RangeFetchFailed {
                year,
                cause: Box::new(cause),
            }
        })?;
        debug!(year, rows = table.len(), "year appended");
        combined.append(table);
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn year_table(year: i32) -> ReportTable {
        ReportTable::new(
            vec!["year".to_string()],
            vec![vec![year.to_string()]],
        )
    }

    #[test]
    fn years_are_stacked_in_order() {
        let mut calls = Vec::new();
        let table = aggregate_years(2019, 2021, |year| {
            calls.push(year);
            Ok(year_table(year))
        })
        .unwrap();
        assert_eq!(calls, vec![2019, 2020, 2021]);
        let years: Vec<_> = table.rows().iter().map(|row| row[0].as_str()).collect();
        assert_eq!(years, vec!["2019", "2020", "2021"]);
    }

    #[test]
    fn first_failure_stops_the_range() {
        let mut calls = Vec::new();
        let err = aggregate_years(2020, 2022, |year| {
            calls.push(year);
            if year == 2021 {
                Err(CotError::NoDataFileFound {
                    entries_seen: Vec::new(),
                })
            } else {
                Ok(year_table(year))
            }
        })
        .unwrap_err();
        assert_eq!(calls, vec![2020, 2021]);
        assert_matches!(err, CotError::RangeFetchFailed { year: 2021, .. });
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = aggregate_years(2022, 2020, |_| unreachable!()).unwrap_err();
        assert_matches!(err, CotError::InvalidYearRange { start: 2022, end: 2020 });
    }
}
