//! Fiscal calendar generation.
//!
//! Splits a fiscal-year range into consecutive monthly, quarterly or yearly
//! periods. Periods after the first start on the first of a calendar month;
//! the last one is clipped to the end of the fiscal year.

use chrono::{Datelike, Months, NaiveDate};
use tally_shared::types::DateRange;

use super::period::{NewAccountingPeriod, PeriodType};
use crate::ledger::error::LedgerError;

/// Builds the periods of one fiscal year.
///
/// # Errors
///
/// Returns `InvalidDateRange` if a clipped trailing period would be a
/// single day.
pub fn generate_periods(
    fiscal_year: i32,
    year: DateRange,
    period_type: PeriodType,
) -> Result<Vec<NewAccountingPeriod>, LedgerError> {
    let mut periods = Vec::new();
    let mut current = year.start();
    let mut period_number: u32 = 1;

    while current <= year.end() {
        let next_start = first_of_month(current)
            .and_then(|first| first.checked_add_months(Months::new(period_type.months())));
        let period_end = next_start
            .and_then(|next| next.pred_opt())
            .map_or(year.end(), |last| last.min(year.end()));

        periods.push(NewAccountingPeriod {
            name: period_name(period_type, fiscal_year, period_number, current),
            range: DateRange::new(current, period_end)?,
            fiscal_year,
            period_type,
            is_adjustment_period: false,
        });

        match next_start {
            Some(next) => current = next,
            None => break,
        }
        period_number += 1;
    }

    Ok(periods)
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

fn period_name(period_type: PeriodType, fiscal_year: i32, number: u32, start: NaiveDate) -> String {
    match period_type {
        PeriodType::Monthly => format!("{} {}", month_name(start.month()), start.year()),
        PeriodType::Quarterly => format!("Q{number} {fiscal_year}"),
        PeriodType::Yearly => format!("FY {fiscal_year}"),
    }
}

/// Returns month name.
fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar_2026() -> DateRange {
        DateRange::new(date(2026, 1, 1), date(2026, 12, 31)).unwrap()
    }

    #[test]
    fn test_monthly_calendar_year() {
        let periods = generate_periods(2026, calendar_2026(), PeriodType::Monthly).unwrap();
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0].name, "January 2026");
        assert_eq!(periods[0].range.end(), date(2026, 1, 31));
        assert_eq!(periods[1].range.end(), date(2026, 2, 28));
        assert_eq!(periods[11].name, "December 2026");
        assert_eq!(periods[11].range.end(), date(2026, 12, 31));
    }

    #[test]
    fn test_monthly_leap_year_february() {
        let year = DateRange::new(date(2028, 1, 1), date(2028, 12, 31)).unwrap();
        let periods = generate_periods(2028, year, PeriodType::Monthly).unwrap();
        assert_eq!(periods[1].range.end(), date(2028, 2, 29));
    }

    #[test]
    fn test_quarterly_offset_fiscal_year() {
        let year = DateRange::new(date(2025, 7, 1), date(2026, 6, 30)).unwrap();
        let periods = generate_periods(2026, year, PeriodType::Quarterly).unwrap();
        let names: Vec<_> = periods.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Q1 2026", "Q2 2026", "Q3 2026", "Q4 2026"]);
        assert_eq!(periods[0].range.start(), date(2025, 7, 1));
        assert_eq!(periods[0].range.end(), date(2025, 9, 30));
        assert_eq!(periods[3].range.end(), date(2026, 6, 30));
    }

    #[test]
    fn test_yearly() {
        let periods = generate_periods(2026, calendar_2026(), PeriodType::Yearly).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].name, "FY 2026");
        assert_eq!(periods[0].range, calendar_2026());
    }

    #[test]
    fn test_mid_month_start_aligns_following_periods() {
        let year = DateRange::new(date(2026, 1, 15), date(2026, 3, 31)).unwrap();
        let periods = generate_periods(2026, year, PeriodType::Monthly).unwrap();
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].range.start(), date(2026, 1, 15));
        assert_eq!(periods[0].range.end(), date(2026, 1, 31));
        assert_eq!(periods[1].range.start(), date(2026, 2, 1));
    }

    #[test]
    fn test_periods_do_not_overlap() {
        let periods = generate_periods(2026, calendar_2026(), PeriodType::Monthly).unwrap();
        for pair in periods.windows(2) {
            assert!(!pair[0].range.overlaps(&pair[1].range));
            assert_eq!(pair[0].range.end().succ_opt(), Some(pair[1].range.start()));
        }
    }

    #[test]
    fn test_single_day_tail_rejected() {
        let year = DateRange::new(date(2026, 1, 1), date(2026, 2, 1)).unwrap();
        assert!(matches!(
            generate_periods(2026, year, PeriodType::Monthly),
            Err(LedgerError::InvalidDateRange { .. })
        ));
    }
}
