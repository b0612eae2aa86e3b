use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Fraction, RoundingMode};
use crate::errors::{MortgageError, Result};
use crate::types::Payment;

/// the property securing the mortgage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    /// an existing home, bought in one payment
    Existing {
        purchase: Payment,
        appraised_value: Amount,
    },
    /// a new build, paid in construction installments out of a construction account
    NewConstruction {
        notarial_payment: Payment,
        construction_installments: Vec<Payment>,
        declared_value: Amount,
    },
}

impl Property {
    /// value used as the loan-to-value basis
    pub fn value(&self) -> Amount {
        match self {
            Property::Existing { appraised_value, .. } => appraised_value.clone(),
            Property::NewConstruction { declared_value, .. } => declared_value.clone(),
        }
    }

    pub fn construction_installments(&self) -> &[Payment] {
        match self {
            Property::Existing { .. } => &[],
            Property::NewConstruction {
                construction_installments,
                ..
            } => construction_installments,
        }
    }

    pub fn is_new_construction(&self) -> bool {
        matches!(self, Property::NewConstruction { .. })
    }

    /// sum of all construction installments, the initial construction account balance
    pub fn construction_total(&self) -> Amount {
        self.construction_installments().iter().map(|bill| &bill.amount).sum()
    }

    /// everything paid for the property
    pub fn total_cost(&self) -> Amount {
        match self {
            Property::Existing { purchase, .. } => purchase.amount.clone(),
            Property::NewConstruction { notarial_payment, .. } => {
                &notarial_payment.amount + &self.construction_total()
            }
        }
    }

    /// loan-to-value ratio for an outstanding balance
    pub fn loan_to_value(&self, balance: &Amount) -> Result<Fraction> {
        loan_to_value(balance, &self.value())
    }
}

/// outstanding balance / property value
pub fn loan_to_value(balance: &Amount, value: &Amount) -> Result<Fraction> {
    if value.is_negative() {
        return Err(MortgageError::InvalidInput {
            message: format!("property value cannot be negative: {value}"),
        });
    }
    balance.ratio(value)
}

/// builds construction bills the way a builder invoices them
pub struct ConstructionInstallment;

impl ConstructionInstallment {
    /// a bill for `share` of `contract_sum`, rounded to the cent with `rounding`
    pub fn share_of(
        date: NaiveDate,
        contract_sum: &Amount,
        share: &Fraction,
        rounding: RoundingMode,
        description: impl Into<String>,
    ) -> Payment {
        Payment::new(date, (contract_sum * share).rounded_to_the_cent_with(rounding))
            .with_description(description)
    }
}
