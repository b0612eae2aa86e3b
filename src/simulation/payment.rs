use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Fraction};
use crate::errors::{MortgageError, Result};
use crate::interest::ApplicableInterestRate;
use crate::types::{MortgagePartId, PaymentPeriod};

/// what one mortgage part owes for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgagePartPayment {
    pub part_id: MortgagePartId,
    pub period: PaymentPeriod,
    pub balance_before: Amount,
    pub principal_reduction: Amount,
    pub extra_principal_reduction: Amount,
    pub interest: Amount,
    pub applied_rate: ApplicableInterestRate,
}

impl MortgagePartPayment {
    pub fn balance_after(&self) -> Amount {
        &self.balance_before - &self.principal_reduction - &self.extra_principal_reduction
    }

    /// regular instalment: principal + interest, rounded to the cent
    pub fn total(&self) -> Amount {
        (&self.principal_reduction + &self.interest).rounded_to_the_cent()
    }
}

/// all parts' payments for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgagePayment {
    pub period: PaymentPeriod,
    pub parts: Vec<MortgagePartPayment>,
    /// annual rate averaged over the parts, weighted by balance before payment
    pub applied_rate: ApplicableInterestRate,
}

impl MortgagePayment {
    pub fn new(period: PaymentPeriod, parts: Vec<MortgagePartPayment>) -> Result<Self> {
        let applied_rate = weighted_rate(&parts)?;
        Ok(Self {
            period,
            parts,
            applied_rate,
        })
    }

    pub fn principal_reduction(&self) -> Amount {
        self.parts.iter().map(|part| &part.principal_reduction).sum()
    }

    pub fn extra_principal_reduction(&self) -> Amount {
        self.parts.iter().map(|part| &part.extra_principal_reduction).sum()
    }

    pub fn interest(&self) -> Amount {
        self.parts.iter().map(|part| &part.interest).sum()
    }

    /// principal + interest over all parts, rounded to the cent
    pub fn total_due(&self) -> Amount {
        (self.principal_reduction() + self.interest()).rounded_to_the_cent()
    }

    pub fn balance_before(&self) -> Amount {
        self.parts.iter().map(|part| &part.balance_before).sum()
    }

    pub fn balance_after(&self) -> Amount {
        self.parts.iter().map(MortgagePartPayment::balance_after).sum()
    }

    pub fn part(&self, part_id: MortgagePartId) -> Option<&MortgagePartPayment> {
        self.parts.iter().find(|part| part.part_id == part_id)
    }
}

fn weighted_rate(parts: &[MortgagePartPayment]) -> Result<ApplicableInterestRate> {
    let first = parts.first().ok_or(MortgageError::InvalidInput {
        message: "a mortgage payment needs at least one part".to_string(),
    })?;
    let convention = first.applied_rate.day_count_convention;
    if let Some(other) = parts
        .iter()
        .find(|part| part.applied_rate.day_count_convention != convention)
    {
        return Err(MortgageError::MismatchedConventions {
            expected: convention,
            found: other.applied_rate.day_count_convention,
        });
    }

    let total: Amount = parts.iter().map(|part| &part.balance_before).sum();
    if total.is_zero() {
        return Ok(first.applied_rate.clone());
    }

    let weighted: Amount = parts
        .iter()
        .map(|part| &part.balance_before * &part.applied_rate.annual_rate)
        .sum();
    let annual_rate: Fraction = weighted.ratio(&total)?;
    Ok(ApplicableInterestRate::new(annual_rate, convention))
}
