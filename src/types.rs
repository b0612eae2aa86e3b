use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Amount;
use crate::errors::{MortgageError, Result};

/// unique identifier for a mortgage part
pub type MortgagePartId = Uuid;

/// calendar month without a day component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "MonthParts", into = "MonthParts")]
pub struct AbsoluteMonth {
    first_day: NaiveDate,
}

#[derive(Serialize, Deserialize)]
struct MonthParts {
    year: i32,
    month: u32,
}

impl AbsoluteMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(MortgageError::InvalidMonth { month });
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| MortgageError::InvalidDate {
            message: format!("year {year} is out of range"),
        })?;
        Ok(Self { first_day })
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn next(&self) -> Result<Self> {
        self.plus_months(1)
    }

    /// shift by `months`, wrapping year boundaries in both directions
    pub fn plus_months(&self, months: i32) -> Result<Self> {
        let index = i64::from(self.year()) * 12 + i64::from(self.month()) - 1 + i64::from(months);
        let year = i32::try_from(index.div_euclid(12)).map_err(|_| MortgageError::InvalidDate {
            message: format!("{self} plus {months} months is out of range"),
        })?;
        AbsoluteMonth::new(year, index.rem_euclid(12) as u32 + 1)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }
}

impl TryFrom<MonthParts> for AbsoluteMonth {
    type Error = MortgageError;

    fn try_from(parts: MonthParts) -> Result<Self> {
        AbsoluteMonth::new(parts.year, parts.month)
    }
}

impl From<AbsoluteMonth> for MonthParts {
    fn from(month: AbsoluteMonth) -> Self {
        MonthParts {
            year: month.year(),
            month: month.month(),
        }
    }
}

impl From<NaiveDate> for AbsoluteMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            first_day: first_of_month(date),
        }
    }
}

impl fmt::Display for AbsoluteMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for AbsoluteMonth {
    type Err = MortgageError;

    /// parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MortgageError::InvalidDate {
            message: format!("expected YYYY-MM, got {s:?}"),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        AbsoluteMonth::new(year, month)
    }
}

/// half-open date range `[start, end_exclusive)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodBounds")]
pub struct PaymentPeriod {
    start: NaiveDate,
    end_exclusive: NaiveDate,
}

#[derive(Deserialize)]
struct PeriodBounds {
    start: NaiveDate,
    end_exclusive: NaiveDate,
}

impl TryFrom<PeriodBounds> for PaymentPeriod {
    type Error = MortgageError;

    fn try_from(bounds: PeriodBounds) -> Result<Self> {
        PaymentPeriod::new(bounds.start, bounds.end_exclusive)
    }
}

impl PaymentPeriod {
    pub fn new(start: NaiveDate, end_exclusive: NaiveDate) -> Result<Self> {
        if start >= end_exclusive {
            return Err(MortgageError::InvalidPeriod { start, end_exclusive });
        }
        Ok(Self { start, end_exclusive })
    }

    /// the full calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Result<Self> {
        PaymentPeriod::new(first_of_month(date), first_of_next_month(date)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end_exclusive(&self) -> NaiveDate {
        self.end_exclusive
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end_exclusive
    }

    /// actual calendar days in the period
    pub fn days(&self) -> i64 {
        (self.end_exclusive - self.start).num_days()
    }

    /// true when the period covers a whole calendar month
    pub fn is_full_month(&self) -> bool {
        self.start.day() == 1 && first_of_next_month(self.start).ok() == Some(self.end_exclusive)
    }

    /// the part of this period before `limit`, if any
    pub fn clipped_to(&self, limit: NaiveDate) -> Option<PaymentPeriod> {
        let end = self.end_exclusive.min(limit);
        PaymentPeriod::new(self.start, end).ok()
    }

    /// split into `[start, date)` and `[date, end)`; either side may be absent
    pub fn split_at(&self, date: NaiveDate) -> (Option<PaymentPeriod>, Option<PaymentPeriod>) {
        let date = date.clamp(self.start, self.end_exclusive);
        (
            PaymentPeriod::new(self.start, date).ok(),
            PaymentPeriod::new(date, self.end_exclusive).ok(),
        )
    }
}

impl fmt::Display for PaymentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end_exclusive)
    }
}

/// dated cash movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub date: NaiveDate,
    pub amount: Amount,
    pub description: Option<String>,
}

impl Payment {
    pub fn new(date: NaiveDate, amount: Amount) -> Self {
        Self {
            date,
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn first_of_next_month(date: NaiveDate) -> Result<NaiveDate> {
    add_months(first_of_month(date), 1)
}

/// add calendar months, clamping the day to the end of the target month
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| MortgageError::InvalidDate {
            message: format!("{date} plus {months} months is out of range"),
        })
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub fn days_in_year(year: i32) -> i64 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}
