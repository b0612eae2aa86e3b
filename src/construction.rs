use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ConstructionAccountPolicy;
use crate::decimal::Amount;
use crate::errors::{MortgageError, Result};
use crate::interest::{interest_by_parts, ApplicableInterestRate};
use crate::payments::SortedPayments;
use crate::types::{add_months, Payment, PaymentPeriod};

/// state of the construction account over one payment period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionAccountSummary {
    pub period: PaymentPeriod,
    pub balance_before: Amount,
    pub bills: Vec<Payment>,
    /// interest earned on the undrawn balance this period, rounded to the cent
    pub interest_generated: Amount,
    /// interest generated the previous period, credited against this period's collection
    pub interest_deducted: Amount,
}

impl ConstructionAccountSummary {
    pub fn bills_total(&self) -> Amount {
        self.bills.iter().map(|bill| &bill.amount).sum()
    }

    pub fn balance_after(&self) -> Amount {
        &self.balance_before - &self.bills_total()
    }
}

/// Holding account that pays out construction bills from the undrawn part of
/// the mortgage.
///
/// The account starts at the sum of all installments and drops with every
/// bill. Interest accrues on the undrawn balance until the policy's cutoff and
/// is credited one period later.
#[derive(Debug, Clone)]
pub struct ConstructionAccount {
    bills: SortedPayments,
    balance: Amount,
    policy: ConstructionAccountPolicy,
    interest_end: Option<NaiveDate>,
    pending_interest: Amount,
}

impl ConstructionAccount {
    pub fn new(
        installments: Vec<Payment>,
        policy: ConstructionAccountPolicy,
        mortgage_start: NaiveDate,
    ) -> Result<Self> {
        if let Some(bill) = installments.iter().find(|bill| bill.date < mortgage_start) {
            return Err(MortgageError::InvalidInput {
                message: format!(
                    "construction bill on {} precedes the mortgage start {}",
                    bill.date, mortgage_start
                ),
            });
        }
        if let Some(bill) = installments.iter().find(|bill| bill.amount.is_negative()) {
            return Err(MortgageError::InvalidInput {
                message: format!("construction bill on {} is negative: {}", bill.date, bill.amount),
            });
        }

        let interest_end = match policy.interest_months {
            Some(months) => Some(add_months(mortgage_start, months)?),
            None => None,
        };
        let bills = SortedPayments::new(installments);
        let balance = bills.total();

        Ok(Self {
            bills,
            balance,
            policy,
            interest_end,
            pending_interest: Amount::zero(),
        })
    }

    /// undrawn balance
    pub fn balance(&self) -> &Amount {
        &self.balance
    }

    /// first day on which no more interest accrues, if capped
    pub fn interest_end(&self) -> Option<NaiveDate> {
        self.interest_end
    }

    pub fn policy(&self) -> &ConstructionAccountPolicy {
        &self.policy
    }

    /// bills not yet paid out
    pub fn outstanding_bills(&self) -> &[Payment] {
        self.bills.remaining()
    }

    /// empty, with no interest left to credit
    pub fn is_settled(&self) -> bool {
        self.balance.is_zero() && self.pending_interest.is_zero()
    }

    /// pay out the period's bills and accrue interest on what is left
    pub fn step(
        &mut self,
        period: &PaymentPeriod,
        interest_rate: &ApplicableInterestRate,
    ) -> Result<ConstructionAccountSummary> {
        let balance_before = self.balance.clone();
        let bills = self.bills.pop_before(period.end_exclusive());

        let accrual_period = match self.interest_end {
            Some(end) => period.clipped_to(end),
            None => Some(*period),
        };
        let interest_generated = match accrual_period {
            Some(accrual) if balance_before.is_positive() => interest_by_parts(
                &balance_before,
                &bills,
                &accrual,
                interest_rate.day_count_convention,
                &interest_rate.annual_rate,
            )?
            .rounded_to_the_cent_with(self.policy.interest_rounding),
            _ => Amount::zero(),
        };

        let summary = ConstructionAccountSummary {
            period: *period,
            balance_before,
            bills,
            interest_generated: interest_generated.clone(),
            interest_deducted: std::mem::replace(&mut self.pending_interest, interest_generated),
        };

        self.balance = summary.balance_after();
        if self.balance.is_negative() {
            return Err(MortgageError::InvalidInput {
                message: format!("construction account overdrawn to {} in {}", self.balance, period),
            });
        }

        log::debug!(
            "construction {}: balance {} -> {}, interest {} generated, {} deducted",
            period,
            summary.balance_before,
            self.balance,
            summary.interest_generated,
            summary.interest_deducted
        );
        Ok(summary)
    }
}
