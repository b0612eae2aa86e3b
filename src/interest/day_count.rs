use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::Fraction;
use crate::errors::{MortgageError, Result};
use crate::types::{days_in_year, is_last_day_of_month, PaymentPeriod};

/// day count convention for prorating an annual rate over a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCountConvention {
    /// actual days / actual days in year, split per calendar year (ISDA)
    ActualActual,
    /// 30 days per month / 360, day 31 becomes 30
    ThirtyE360,
    /// 30 days per month / 360, the last day of any month becomes 30
    ThirtyE360Isda,
}

impl DayCountConvention {
    /// fraction of a year covered by `period`
    pub fn day_count_factor(&self, period: &PaymentPeriod) -> Result<Fraction> {
        match self {
            DayCountConvention::ActualActual => actual_actual_factor(period),
            DayCountConvention::ThirtyE360 | DayCountConvention::ThirtyE360Isda => {
                Fraction::from_ratio(self.day_count(period), 360)
            }
        }
    }

    /// number of days in `period` as counted by this convention
    pub fn day_count(&self, period: &PaymentPeriod) -> i64 {
        match self {
            DayCountConvention::ActualActual => period.days(),
            DayCountConvention::ThirtyE360 => {
                thirty_360_days(period.start(), period.end_exclusive(), |d| d.day() == 31)
            }
            DayCountConvention::ThirtyE360Isda => {
                thirty_360_days(period.start(), period.end_exclusive(), is_last_day_of_month)
            }
        }
    }

    /// whether a month can be treated as a fixed twelfth of a year
    pub fn supports_fixed_monthly_rate(&self) -> bool {
        !matches!(self, DayCountConvention::ActualActual)
    }
}

fn thirty_360_days(start: NaiveDate, end: NaiveDate, clamp: impl Fn(NaiveDate) -> bool) -> i64 {
    let day = |date: NaiveDate| if clamp(date) { 30 } else { date.day() as i64 };
    let years = (end.year() - start.year()) as i64;
    let months = end.month() as i64 - start.month() as i64;
    360 * years + 30 * months + (day(end) - day(start))
}

fn actual_actual_factor(period: &PaymentPeriod) -> Result<Fraction> {
    let start = period.start();
    let end = period.end_exclusive();

    if start.year() == end.year() {
        return Fraction::from_ratio(period.days(), days_in_year(start.year()));
    }

    let start_year_end = year_start(start.year() + 1)?;
    let end_year_start = year_start(end.year())?;
    let head = Fraction::from_ratio((start_year_end - start).num_days(), days_in_year(start.year()))?;
    let tail = Fraction::from_ratio((end - end_year_start).num_days(), days_in_year(end.year()))?;
    let whole_years = (end.year() - start.year() - 1) as i64;

    Ok(head + tail + Fraction::one() * whole_years)
}

fn year_start(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| MortgageError::InvalidDate {
        message: format!("year {year} is out of range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> PaymentPeriod {
        PaymentPeriod::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    fn ratio(n: i64, d: i64) -> Fraction {
        Fraction::from_ratio(n, d).unwrap()
    }

    #[test]
    fn test_actual_actual_full_non_leap_year_is_one() {
        let factor = DayCountConvention::ActualActual
            .day_count_factor(&period((2023, 1, 1), (2024, 1, 1)))
            .unwrap();
        assert_eq!(factor, Fraction::one());
    }

    #[test]
    fn test_actual_actual_across_leap_year() {
        let factor = DayCountConvention::ActualActual
            .day_count_factor(&period((2024, 2, 1), (2025, 2, 1)))
            .unwrap();
        assert_eq!(factor, ratio(335, 366) + ratio(31, 365));
    }

    #[test]
    fn test_actual_actual_counts_whole_years_in_between() {
        let factor = DayCountConvention::ActualActual
            .day_count_factor(&period((2022, 7, 1), (2025, 7, 1)))
            .unwrap();
        assert_eq!(factor, ratio(184, 365) + ratio(181, 365) + Fraction::one() * 2);
    }

    #[test]
    fn test_actual_actual_within_one_year() {
        let factor = DayCountConvention::ActualActual
            .day_count_factor(&period((2024, 2, 1), (2024, 3, 1)))
            .unwrap();
        assert_eq!(factor, ratio(29, 366));
    }

    #[test]
    fn test_thirty_e_360_clamps_31st() {
        let p = period((2023, 1, 31), (2024, 2, 1));
        assert_eq!(DayCountConvention::ThirtyE360.day_count(&p), 361);
        assert_eq!(DayCountConvention::ThirtyE360.day_count_factor(&p).unwrap(), ratio(361, 360));
    }

    #[test]
    fn test_isda_variant_clamps_end_of_february() {
        let p = period((2023, 2, 28), (2023, 3, 1));
        assert_eq!(DayCountConvention::ThirtyE360.day_count_factor(&p).unwrap(), ratio(3, 360));
        assert_eq!(DayCountConvention::ThirtyE360Isda.day_count_factor(&p).unwrap(), ratio(1, 360));

        // feb 28 is not the last day of a leap february
        let p = period((2024, 2, 28), (2024, 3, 1));
        assert_eq!(DayCountConvention::ThirtyE360Isda.day_count(&p), 3);
        let p = period((2024, 2, 29), (2024, 3, 1));
        assert_eq!(DayCountConvention::ThirtyE360Isda.day_count(&p), 1);
    }

    #[test]
    fn test_isda_variant_clamps_end_of_thirty_day_month() {
        let p = period((2024, 4, 30), (2024, 5, 31));
        assert_eq!(DayCountConvention::ThirtyE360.day_count(&p), 30);
        assert_eq!(DayCountConvention::ThirtyE360Isda.day_count(&p), 30);
        let p = period((2024, 4, 29), (2024, 4, 30));
        assert_eq!(DayCountConvention::ThirtyE360.day_count(&p), 1);
        assert_eq!(DayCountConvention::ThirtyE360Isda.day_count(&p), 1);
    }

    #[test]
    fn test_full_month_is_a_twelfth_under_thirty_360() {
        for convention in [DayCountConvention::ThirtyE360, DayCountConvention::ThirtyE360Isda] {
            let feb = period((2024, 2, 1), (2024, 3, 1));
            assert_eq!(convention.day_count(&feb), 30);
            let partial = period((2023, 11, 17), (2023, 12, 1));
            assert_eq!(convention.day_count(&partial), 14);
        }
    }

    #[test]
    fn test_fixed_monthly_rate_support() {
        assert!(!DayCountConvention::ActualActual.supports_fixed_monthly_rate());
        assert!(DayCountConvention::ThirtyE360.supports_fixed_monthly_rate());
        assert!(DayCountConvention::ThirtyE360Isda.supports_fixed_monthly_rate());
    }
}
