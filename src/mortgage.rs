use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::errors::{MortgageError, Result};
use crate::interest::{DayCountConvention, InterestRate};
use crate::payments::RepaymentScheme;
use crate::types::{add_months, first_of_next_month, MortgagePartId, Payment, PaymentPeriod};

/// independently rated and scheduled sub-loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgagePart {
    pub id: MortgagePartId,
    pub principal: Amount,
    pub interest_rate: InterestRate,
    pub repayment_scheme: RepaymentScheme,
    pub extra_payments: Vec<Payment>,
}

impl MortgagePart {
    pub fn new(principal: Amount, interest_rate: InterestRate, repayment_scheme: RepaymentScheme) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal,
            interest_rate,
            repayment_scheme,
            extra_payments: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: MortgagePartId) -> Self {
        self.id = id;
        self
    }

    pub fn with_extra_payment(mut self, payment: Payment) -> Self {
        self.extra_payments.push(payment);
        self
    }

    pub fn with_extra_payments(mut self, payments: impl IntoIterator<Item = Payment>) -> Self {
        self.extra_payments.extend(payments);
        self
    }

    fn validate(&self, convention: DayCountConvention) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(MortgageError::InvalidConfiguration {
                message: format!("part {} has non-positive principal {}", self.id, self.principal),
            });
        }

        let found = self.interest_rate.day_count_convention();
        if found != convention {
            return Err(MortgageError::MismatchedConventions {
                expected: convention,
                found,
            });
        }

        self.repayment_scheme.check_convention(convention)?;

        if let Some(payment) = self.extra_payments.iter().find(|p| !p.amount.is_positive()) {
            return Err(MortgageError::InvalidInput {
                message: format!("extra payment on {} must be positive, got {}", payment.date, payment.amount),
            });
        }
        Ok(())
    }
}

/// a mortgage composed of one or more parts sharing term and convention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MortgageParts")]
pub struct Mortgage {
    start_date: NaiveDate,
    term_in_years: u32,
    day_count_convention: DayCountConvention,
    parts: Vec<MortgagePart>,
}

#[derive(Deserialize)]
struct MortgageParts {
    start_date: NaiveDate,
    term_in_years: u32,
    day_count_convention: DayCountConvention,
    parts: Vec<MortgagePart>,
}

impl TryFrom<MortgageParts> for Mortgage {
    type Error = MortgageError;

    fn try_from(parts: MortgageParts) -> Result<Self> {
        Mortgage::new(parts.start_date, parts.term_in_years, parts.day_count_convention, parts.parts)
    }
}

impl Mortgage {
    pub fn new(
        start_date: NaiveDate,
        term_in_years: u32,
        day_count_convention: DayCountConvention,
        parts: Vec<MortgagePart>,
    ) -> Result<Self> {
        let mortgage = Self {
            start_date,
            term_in_years,
            day_count_convention,
            parts,
        };
        mortgage.validate()?;
        Ok(mortgage)
    }

    /// check the invariants `new` enforces, e.g. after deserializing
    pub fn validate(&self) -> Result<()> {
        if self.term_in_years == 0 {
            return Err(MortgageError::InvalidConfiguration {
                message: "term must be at least one year".to_string(),
            });
        }
        if self.parts.is_empty() {
            return Err(MortgageError::InvalidConfiguration {
                message: "a mortgage needs at least one part".to_string(),
            });
        }
        for part in &self.parts {
            part.validate(self.day_count_convention)?;
        }
        // reject terms that run off the calendar up front
        self.end_date()?;
        Ok(())
    }

    pub fn builder() -> MortgageBuilder {
        MortgageBuilder::new()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn term_in_years(&self) -> u32 {
        self.term_in_years
    }

    pub fn day_count_convention(&self) -> DayCountConvention {
        self.day_count_convention
    }

    pub fn parts(&self) -> &[MortgagePart] {
        &self.parts
    }

    pub fn principal(&self) -> Amount {
        self.parts.iter().map(|part| &part.principal).sum()
    }

    /// number of full monthly repayment periods
    pub fn full_months(&self) -> Result<u32> {
        self.term_in_years
            .checked_mul(12)
            .ok_or_else(|| MortgageError::InvalidConfiguration {
                message: format!("term of {} years is too long", self.term_in_years),
            })
    }

    /// true when the start date leaves a partial first month
    pub fn starts_mid_month(&self) -> bool {
        self.start_date.day() != 1
    }

    /// first day of the first full repayment month
    pub fn first_full_month(&self) -> Result<NaiveDate> {
        if self.starts_mid_month() {
            first_of_next_month(self.start_date)
        } else {
            Ok(self.start_date)
        }
    }

    /// exclusive end of the last period
    pub fn end_date(&self) -> Result<NaiveDate> {
        add_months(self.first_full_month()?, self.full_months()?)
    }

    /// All payment periods in order: an interest-only partial month when the
    /// mortgage starts mid-month, then one period per full calendar month.
    pub fn periods(&self) -> Result<Vec<PaymentPeriod>> {
        let first_full = self.first_full_month()?;
        let full_months = self.full_months()?;
        let mut periods = Vec::with_capacity(full_months as usize + 1);
        if self.starts_mid_month() {
            periods.push(PaymentPeriod::new(self.start_date, first_full)?);
        }
        for month in 0..full_months {
            periods.push(PaymentPeriod::new(
                add_months(first_full, month)?,
                add_months(first_full, month + 1)?,
            )?);
        }
        Ok(periods)
    }
}

/// builder for mortgages
#[derive(Debug, Default)]
pub struct MortgageBuilder {
    start_date: Option<NaiveDate>,
    term_in_years: Option<u32>,
    day_count_convention: Option<DayCountConvention>,
    parts: Vec<MortgagePart>,
}

impl MortgageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn term_in_years(mut self, years: u32) -> Self {
        self.term_in_years = Some(years);
        self
    }

    pub fn day_count_convention(mut self, convention: DayCountConvention) -> Self {
        self.day_count_convention = Some(convention);
        self
    }

    pub fn part(mut self, part: MortgagePart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn build(self) -> Result<Mortgage> {
        let start_date = self.start_date.ok_or(MortgageError::InvalidConfiguration {
            message: "Start date required".to_string(),
        })?;

        let term_in_years = self.term_in_years.ok_or(MortgageError::InvalidConfiguration {
            message: "Term required".to_string(),
        })?;

        // default to the convention of the first part
        let day_count_convention = match self.day_count_convention {
            Some(convention) => convention,
            None => self
                .parts
                .first()
                .map(|part| part.interest_rate.day_count_convention())
                .ok_or(MortgageError::InvalidConfiguration {
                    message: "Day count convention or at least one part required".to_string(),
                })?,
        };

        Mortgage::new(start_date, term_in_years, day_count_convention, self.parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Fraction;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn part(convention: DayCountConvention, scheme: RepaymentScheme) -> MortgagePart {
        MortgagePart::new(
            Amount::from_major(100_000),
            InterestRate::fixed(Fraction::from_percentage(dec!(4)), convention),
            scheme,
        )
    }

    #[test]
    fn test_mid_month_start_adds_partial_period() {
        let mortgage = Mortgage::builder()
            .start_date(date(2023, 11, 17))
            .term_in_years(30)
            .part(part(DayCountConvention::ThirtyE360Isda, RepaymentScheme::Annuity))
            .build()
            .unwrap();

        let periods = mortgage.periods().unwrap();
        assert_eq!(periods.len(), 361);
        assert_eq!(periods[0], PaymentPeriod::new(date(2023, 11, 17), date(2023, 12, 1)).unwrap());
        assert_eq!(periods[1], PaymentPeriod::new(date(2023, 12, 1), date(2024, 1, 1)).unwrap());
        assert_eq!(periods[360].end_exclusive(), date(2053, 12, 1));
        assert_eq!(mortgage.end_date().unwrap(), date(2053, 12, 1));
        assert_eq!(mortgage.day_count_convention(), DayCountConvention::ThirtyE360Isda);
    }

    #[test]
    fn test_first_of_month_start_has_no_partial_period() {
        let mortgage = Mortgage::new(
            date(2024, 1, 1),
            1,
            DayCountConvention::ThirtyE360,
            vec![part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)],
        )
        .unwrap();

        let periods = mortgage.periods().unwrap();
        assert_eq!(periods.len(), 12);
        assert!(periods.iter().all(|p| p.is_full_month()));
        for pair in periods.windows(2) {
            assert_eq!(pair[0].end_exclusive(), pair[1].start());
        }
        assert_eq!(periods[11].end_exclusive(), date(2025, 1, 1));
    }

    #[test]
    fn test_parts_must_share_convention() {
        let result = Mortgage::new(
            date(2024, 1, 1),
            30,
            DayCountConvention::ThirtyE360,
            vec![
                part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear),
                part(DayCountConvention::ActualActual, RepaymentScheme::Linear),
            ],
        );
        assert!(matches!(result, Err(MortgageError::MismatchedConventions { .. })));
    }

    #[test]
    fn test_annuity_on_actual_actual_is_rejected() {
        let result = Mortgage::new(
            date(2024, 1, 1),
            30,
            DayCountConvention::ActualActual,
            vec![part(DayCountConvention::ActualActual, RepaymentScheme::Annuity)],
        );
        assert!(matches!(result, Err(MortgageError::IncompatibleConvention { .. })));
    }

    #[test]
    fn test_invalid_mortgages() {
        assert!(Mortgage::new(date(2024, 1, 1), 30, DayCountConvention::ThirtyE360, vec![]).is_err());
        assert!(Mortgage::new(
            date(2024, 1, 1),
            0,
            DayCountConvention::ThirtyE360,
            vec![part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)]
        )
        .is_err());

        let negative_extra = part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)
            .with_extra_payment(Payment::new(date(2024, 5, 1), Amount::from_major(-5)));
        assert!(matches!(
            Mortgage::new(date(2024, 1, 1), 30, DayCountConvention::ThirtyE360, vec![negative_extra]),
            Err(MortgageError::InvalidInput { .. })
        ));

        assert!(Mortgage::builder().term_in_years(30).build().is_err());
    }

    #[test]
    fn test_term_too_long_is_a_configuration_error() {
        for years in [u32::MAX, u32::MAX / 12 + 1, 1_000_000] {
            let result = Mortgage::new(
                date(2024, 1, 1),
                years,
                DayCountConvention::ThirtyE360,
                vec![part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)],
            );
            assert!(result.is_err(), "{years} years accepted");
        }

        let result = Mortgage::new(
            date(2024, 1, 1),
            u32::MAX,
            DayCountConvention::ThirtyE360,
            vec![part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)],
        );
        assert!(matches!(result, Err(MortgageError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_mortgage_json_with_overflowing_term_is_rejected() {
        let mortgage = Mortgage::new(
            date(2024, 1, 1),
            30,
            DayCountConvention::ThirtyE360,
            vec![part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)],
        )
        .unwrap();
        let mut json = serde_json::to_value(&mortgage).unwrap();
        assert_eq!(serde_json::from_value::<Mortgage>(json.clone()).unwrap(), mortgage);

        json["term_in_years"] = serde_json::json!(u32::MAX);
        let error = serde_json::from_value::<Mortgage>(json).unwrap_err();
        assert!(error.to_string().contains("too long"), "{error}");
    }

    #[test]
    fn test_mortgage_json_goes_through_validation() {
        let mortgage = Mortgage::new(
            date(2024, 1, 1),
            30,
            DayCountConvention::ThirtyE360,
            vec![part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear)],
        )
        .unwrap();
        let json = serde_json::to_value(&mortgage).unwrap();

        let mut mixed = json.clone();
        mixed["parts"][0]["interest_rate"]["Fixed"]["day_count_convention"] = serde_json::json!("ActualActual");
        assert!(serde_json::from_value::<Mortgage>(mixed).is_err());

        let mut empty = json.clone();
        empty["parts"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Mortgage>(empty).is_err());

        let mut zero_term = json;
        zero_term["term_in_years"] = serde_json::json!(0);
        assert!(serde_json::from_value::<Mortgage>(zero_term).is_err());
    }

    #[test]
    fn test_principal_sums_parts() {
        let mortgage = Mortgage::builder()
            .start_date(date(2024, 1, 1))
            .term_in_years(30)
            .day_count_convention(DayCountConvention::ThirtyE360)
            .part(part(DayCountConvention::ThirtyE360, RepaymentScheme::Linear))
            .part(part(DayCountConvention::ThirtyE360, RepaymentScheme::Annuity))
            .build()
            .unwrap();
        assert_eq!(mortgage.principal(), Amount::from_major(200_000));
        assert_eq!(mortgage.full_months().unwrap(), 360);
    }
}
