use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SimulationSettings;
use crate::construction::ConstructionAccountSummary;
use crate::decimal::{Amount, Fraction, RoundingMode};
use crate::errors::{MortgageError, Result};
use crate::events::EventStore;
use crate::simulation::payment::MortgagePayment;
use crate::types::AbsoluteMonth;

/// one calendar month of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageMonthSummary {
    pub month: AbsoluteMonth,
    pub payment: MortgagePayment,
    pub construction: Option<ConstructionAccountSummary>,
}

impl MortgageMonthSummary {
    /// construction interest credited this month
    pub fn construction_interest_deducted(&self) -> Amount {
        self.construction
            .as_ref()
            .map_or_else(Amount::zero, |construction| construction.interest_deducted.clone())
    }

    /// what the bank actually debits: total due minus construction interest
    pub fn amount_collected(&self) -> Amount {
        self.payment.total_due() - self.construction_interest_deducted()
    }
}

/// totals over one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageYearSummary {
    pub year: i32,
    pub principal: Amount,
    pub extra_principal: Amount,
    pub interest: Amount,
    pub construction_interest_deducted: Amount,
    pub collected: Amount,
    pub closing_balance: Amount,
}

impl MortgageYearSummary {
    fn empty(year: i32) -> Self {
        Self {
            year,
            principal: Amount::zero(),
            extra_principal: Amount::zero(),
            interest: Amount::zero(),
            construction_interest_deducted: Amount::zero(),
            collected: Amount::zero(),
            closing_balance: Amount::zero(),
        }
    }

    fn absorb(&mut self, month: &MortgageMonthSummary) {
        self.principal += month.payment.principal_reduction();
        self.extra_principal += month.payment.extra_principal_reduction();
        self.interest += month.payment.interest();
        self.construction_interest_deducted += month.construction_interest_deducted();
        self.collected += month.amount_collected();
        self.closing_balance = month.payment.balance_after();
    }
}

/// spread of the monthly collected amounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DistributionSample")]
pub struct PaymentDistribution {
    pub min: Amount,
    pub p10: Amount,
    pub median: Amount,
    pub p90: Amount,
    pub max: Amount,
    /// every collected amount, ascending
    sample: Vec<Amount>,
}

/// the summary fields are derived, so only the sample is read back
#[derive(Deserialize)]
struct DistributionSample {
    sample: Vec<Amount>,
}

impl TryFrom<DistributionSample> for PaymentDistribution {
    type Error = MortgageError;

    fn try_from(parts: DistributionSample) -> Result<Self> {
        PaymentDistribution::new(parts.sample)
    }
}

impl PaymentDistribution {
    pub fn new(mut amounts: Vec<Amount>) -> Result<Self> {
        if amounts.is_empty() {
            return Err(MortgageError::InvalidInput {
                message: "no payments to summarize".to_string(),
            });
        }
        amounts.sort();

        let at = |p: Fraction| nearest_rank(&amounts, &p);
        Ok(Self {
            min: amounts[0].clone(),
            p10: at(Fraction::from_percentage(dec!(10)))?,
            median: at(Fraction::from_percentage(dec!(50)))?,
            p90: at(Fraction::from_percentage(dec!(90)))?,
            max: amounts[amounts.len() - 1].clone(),
            sample: amounts,
        })
    }

    /// nearest-rank percentile, `p` between 0 and 1
    pub fn percentile(&self, p: &Fraction) -> Result<Amount> {
        nearest_rank(&self.sample, p)
    }

    /// the collected amounts the distribution was built from, ascending
    pub fn sample(&self) -> &[Amount] {
        &self.sample
    }
}

fn nearest_rank(sorted: &[Amount], p: &Fraction) -> Result<Amount> {
    if *p < Fraction::zero() || *p > Fraction::one() {
        return Err(MortgageError::InvalidInput {
            message: format!("percentile must be between 0% and 100%, got {p}"),
        });
    }
    if sorted.is_empty() {
        return Err(MortgageError::InvalidInput {
            message: "no payments to summarize".to_string(),
        });
    }

    let n = sorted.len();
    let rank = (Amount::from_i128(n as i128) * p)
        .round_dp(0, RoundingMode::Ceiling)
        .to_i64()
        .and_then(|rank| usize::try_from(rank).ok())
        .unwrap_or(n)
        .clamp(1, n);
    Ok(sorted[rank - 1].clone())
}

/// the full schedule of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub settings: SimulationSettings,
    pub months: Vec<MortgageMonthSummary>,
    pub events: EventStore,
}

impl SimulationResult {
    pub fn total_interest(&self) -> Amount {
        self.months.iter().map(|month| month.payment.interest()).sum()
    }

    /// sum of the regular instalments due
    pub fn total_payments(&self) -> Amount {
        self.months.iter().map(|month| month.payment.total_due()).sum()
    }

    pub fn total_extra_payments(&self) -> Amount {
        self.months
            .iter()
            .map(|month| month.payment.extra_principal_reduction())
            .sum()
    }

    pub fn total_construction_interest(&self) -> Amount {
        self.months
            .iter()
            .map(MortgageMonthSummary::construction_interest_deducted)
            .sum()
    }

    /// sum of what was debited each month
    pub fn total_collected(&self) -> Amount {
        self.months.iter().map(MortgageMonthSummary::amount_collected).sum()
    }

    pub fn month(&self, month: AbsoluteMonth) -> Option<&MortgageMonthSummary> {
        self.months.iter().find(|summary| summary.month == month)
    }

    pub fn payment_distribution(&self) -> Result<PaymentDistribution> {
        PaymentDistribution::new(
            self.months
                .iter()
                .map(MortgageMonthSummary::amount_collected)
                .collect(),
        )
    }

    pub fn yearly_summaries(&self) -> Vec<MortgageYearSummary> {
        let mut years: BTreeMap<i32, MortgageYearSummary> = BTreeMap::new();
        for month in &self.months {
            let year = month.month.year();
            years
                .entry(year)
                .or_insert_with(|| MortgageYearSummary::empty(year))
                .absorb(month);
        }
        years.into_values().collect()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MortgageError::InvalidInput {
            message: format!("cannot serialize simulation result: {e}"),
        })
    }
}
