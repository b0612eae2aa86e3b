use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Fraction};
use crate::errors::Result;
use crate::interest::DayCountConvention;
use crate::types::{Payment, PaymentPeriod};

/// interest accrued over one stretch of constant balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestSegment {
    pub period: PaymentPeriod,
    pub balance: Amount,
    pub day_count_factor: Fraction,
    pub interest: Amount,
}

/// balance x rate x factor, exact
pub fn simple_interest(balance: &Amount, annual_rate: &Fraction, day_count_factor: &Fraction) -> Amount {
    balance * (annual_rate * day_count_factor)
}

/// Interest over `period` on a balance that drops by each reduction on its date.
///
/// Reductions on the same date are applied together. A reduction on
/// `period.start` (or earlier) lowers the balance for the whole period; a
/// reduction on or after `period.end_exclusive` is not part of the period.
pub fn interest_by_parts(
    initial_balance: &Amount,
    reductions: &[Payment],
    period: &PaymentPeriod,
    convention: DayCountConvention,
    annual_rate: &Fraction,
) -> Result<Amount> {
    Ok(interest_segments(initial_balance, reductions, period, convention, annual_rate)?
        .into_iter()
        .map(|segment| segment.interest)
        .sum())
}

/// the per-segment breakdown behind [`interest_by_parts`]
pub fn interest_segments(
    initial_balance: &Amount,
    reductions: &[Payment],
    period: &PaymentPeriod,
    convention: DayCountConvention,
    annual_rate: &Fraction,
) -> Result<Vec<InterestSegment>> {
    let mut segments = Vec::new();
    let mut balance = initial_balance.clone();
    let mut cursor = period.start();

    for (date, amount) in grouped_by_date(reductions, period) {
        if date > cursor {
            segments.push(segment(&balance, PaymentPeriod::new(cursor, date)?, convention, annual_rate)?);
            cursor = date;
        }
        balance -= amount;
    }

    segments.push(segment(
        &balance,
        PaymentPeriod::new(cursor, period.end_exclusive())?,
        convention,
        annual_rate,
    )?);
    Ok(segments)
}

fn segment(
    balance: &Amount,
    period: PaymentPeriod,
    convention: DayCountConvention,
    annual_rate: &Fraction,
) -> Result<InterestSegment> {
    let day_count_factor = convention.day_count_factor(&period)?;
    Ok(InterestSegment {
        interest: simple_interest(balance, annual_rate, &day_count_factor),
        period,
        balance: balance.clone(),
        day_count_factor,
    })
}

/// reductions inside the period, summed per date in date order
fn grouped_by_date(reductions: &[Payment], period: &PaymentPeriod) -> Vec<(NaiveDate, Amount)> {
    let mut relevant: Vec<(NaiveDate, Amount)> = reductions
        .iter()
        .filter(|payment| payment.date < period.end_exclusive())
        .map(|payment| (payment.date.max(period.start()), payment.amount.clone()))
        .collect();
    relevant.sort_by_key(|(date, _)| *date);

    let mut grouped: Vec<(NaiveDate, Amount)> = Vec::with_capacity(relevant.len());
    for (date, amount) in relevant {
        match grouped.last_mut() {
            Some((last_date, total)) if *last_date == date => *total += amount,
            _ => grouped.push((date, amount)),
        }
    }
    grouped
}
