use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Fraction};
use crate::errors::{MortgageError, Result};
use crate::interest::{ApplicableInterestRate, DayCountConvention};

/// how the principal of a mortgage part is paid back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepaymentScheme {
    /// equal principal portion every month
    Linear,
    /// equal principal + interest every month
    Annuity,
}

impl RepaymentScheme {
    /// principal portion of the next monthly payment
    pub fn principal_repayment(
        &self,
        balance: &Amount,
        interest_rate: &ApplicableInterestRate,
        remaining_months: u32,
    ) -> Result<Amount> {
        match self {
            RepaymentScheme::Linear => balance.divide_by(remaining_months as i64),
            RepaymentScheme::Annuity => {
                self.check_convention(interest_rate.day_count_convention)?;
                if remaining_months == 0 {
                    return Err(MortgageError::DivisionByZero);
                }

                let r = interest_rate.monthly_rate()?;
                if r.is_zero() {
                    return balance.divide_by(remaining_months as i64);
                }

                // balance * r / ((1 + r)^n - 1)
                let growth = (Fraction::one() + &r).pow(remaining_months) - Fraction::one();
                (balance * &r).divide_by_fraction(&growth)
            }
        }
    }

    /// fail when the scheme cannot be computed under the rate's convention
    pub fn check_convention(&self, convention: DayCountConvention) -> Result<()> {
        match self {
            RepaymentScheme::Annuity if !convention.supports_fixed_monthly_rate() => {
                Err(MortgageError::IncompatibleConvention {
                    scheme: *self,
                    convention,
                })
            }
            _ => Ok(()),
        }
    }
}

/// constant monthly instalment (principal + interest) of an annuity
pub fn annuity_payment(
    balance: &Amount,
    interest_rate: &ApplicableInterestRate,
    remaining_months: u32,
) -> Result<Amount> {
    let principal = RepaymentScheme::Annuity.principal_repayment(balance, interest_rate, remaining_months)?;
    Ok(principal + balance * interest_rate.monthly_rate()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn rate(p: rust_decimal::Decimal, convention: DayCountConvention) -> ApplicableInterestRate {
        ApplicableInterestRate::new(Fraction::from_percentage(p), convention)
    }

    #[test]
    fn test_linear_divides_balance_evenly() {
        let principal = RepaymentScheme::Linear
            .principal_repayment(
                &Amount::from_major(360_000),
                &rate(dec!(4), DayCountConvention::ActualActual),
                360,
            )
            .unwrap();
        assert_eq!(principal, Amount::from_major(1_000));
    }

    #[test]
    fn test_annuity_first_principal_portion() {
        let r = rate(dec!(6), DayCountConvention::ThirtyE360);
        let principal = RepaymentScheme::Annuity
            .principal_repayment(&Amount::from_major(100_000), &r, 12)
            .unwrap();
        assert_eq!(principal.rounded_to_the_cent(), Amount::from_decimal(dec!(8106.64)));

        let payment = annuity_payment(&Amount::from_major(100_000), &r, 12).unwrap();
        assert_eq!(payment.rounded_to_the_cent(), Amount::from_decimal(dec!(8606.64)));
    }

    #[test]
    fn test_annuity_single_month_repays_everything() {
        let principal = RepaymentScheme::Annuity
            .principal_repayment(
                &Amount::from_decimal(dec!(12345.67)),
                &rate(dec!(3.87), DayCountConvention::ThirtyE360Isda),
                1,
            )
            .unwrap();
        assert_eq!(principal.rounded_to_the_cent(), Amount::from_decimal(dec!(12345.67)));
    }

    #[test]
    fn test_annuity_long_term_is_stable() {
        let r = rate(dec!(3.82), DayCountConvention::ThirtyE360Isda);
        let payment = annuity_payment(&Amount::from_major(350_000), &r, 360).unwrap();
        assert_eq!(payment.rounded_to_the_cent(), Amount::from_decimal(dec!(1634.84)));

        let principal = RepaymentScheme::Annuity
            .principal_repayment(&Amount::from_major(350_000), &r, 480)
            .unwrap();
        assert!(principal.is_positive());
        assert!(principal < Amount::from_major(1_000));
    }

    #[test]
    fn test_annuity_with_zero_rate_is_linear() {
        let principal = RepaymentScheme::Annuity
            .principal_repayment(&Amount::from_major(1_200), &rate(dec!(0), DayCountConvention::ThirtyE360), 12)
            .unwrap();
        assert_eq!(principal, Amount::from_major(100));
    }

    #[test]
    fn test_annuity_rejects_actual_actual() {
        let result = RepaymentScheme::Annuity.principal_repayment(
            &Amount::from_major(100_000),
            &rate(dec!(6), DayCountConvention::ActualActual),
            12,
        );
        assert!(matches!(
            result,
            Err(MortgageError::IncompatibleConvention {
                scheme: RepaymentScheme::Annuity,
                convention: DayCountConvention::ActualActual,
            })
        ));
    }

    #[test]
    fn test_zero_remaining_months_fails() {
        let r = rate(dec!(6), DayCountConvention::ThirtyE360);
        for scheme in [RepaymentScheme::Linear, RepaymentScheme::Annuity] {
            assert!(matches!(
                scheme.principal_repayment(&Amount::from_major(1_000), &r, 0),
                Err(MortgageError::DivisionByZero)
            ));
        }
    }

    proptest! {
        #[test]
        fn prop_linear_is_rate_independent(
            balance in 1i64..10_000_000,
            months in 1u32..480,
            basis_points in 0i64..2_000,
        ) {
            let balance = Amount::from_major(balance);
            let reference = RepaymentScheme::Linear
                .principal_repayment(&balance, &rate(dec!(0), DayCountConvention::ThirtyE360), months)
                .unwrap();
            let annual = Fraction::from_ratio(basis_points, 10_000).unwrap();
            for convention in [
                DayCountConvention::ActualActual,
                DayCountConvention::ThirtyE360,
                DayCountConvention::ThirtyE360Isda,
            ] {
                let other = RepaymentScheme::Linear
                    .principal_repayment(&balance, &ApplicableInterestRate::new(annual.clone(), convention), months)
                    .unwrap();
                prop_assert_eq!(&other, &reference);
            }
        }
    }
}
