use crate::config::{ExtraPaymentAllocation, SimulationSettings};
use crate::construction::{ConstructionAccount, ConstructionAccountSummary};
use crate::decimal::{Amount, Fraction};
use crate::errors::{MortgageError, Result};
use crate::events::{EventStore, SimulationEvent};
use crate::interest::{interest_by_parts, ApplicableInterestRate};
use crate::payments::SortedPayments;
use crate::simulation::payment::{MortgagePartPayment, MortgagePayment};
use crate::simulation::result::{MortgageMonthSummary, SimulationResult};
use crate::types::{AbsoluteMonth, Payment, PaymentPeriod};

/// run a simulation from start to end
pub fn simulate(settings: &SimulationSettings) -> Result<SimulationResult> {
    Simulator::new(settings.clone())?.run()
}

/// Walks the mortgage period by period.
///
/// Holds the only mutable state of a run: part balances, payment cursors and
/// the construction account. A simulator is consumed by [`Simulator::run`].
#[derive(Debug)]
pub struct Simulator {
    settings: SimulationSettings,
    periods: Vec<PaymentPeriod>,
    full_months: u32,
    balances: Vec<Amount>,
    part_extras: Vec<SortedPayments>,
    mortgage_extras: SortedPayments,
    construction: Option<ConstructionAccount>,
    previous_rates: Vec<Option<Fraction>>,
    events: EventStore,
    repaid: bool,
}

impl Simulator {
    pub fn new(settings: SimulationSettings) -> Result<Self> {
        let mortgage = &settings.mortgage;
        mortgage.validate()?;

        if !settings.property.value().is_positive() {
            return Err(MortgageError::InvalidInput {
                message: format!("property value must be positive, got {}", settings.property.value()),
            });
        }

        let start = mortgage.start_date();
        let end = mortgage.end_date()?;
        let within_horizon = |payment: &Payment, what: &str| -> Result<()> {
            if payment.date < start || payment.date >= end {
                return Err(MortgageError::InvalidInput {
                    message: format!("{what} on {} falls outside [{start}, {end})", payment.date),
                });
            }
            Ok(())
        };

        for payment in mortgage.parts().iter().flat_map(|part| &part.extra_payments) {
            within_horizon(payment, "extra payment")?;
        }
        for payment in &settings.extra_payments {
            within_horizon(payment, "extra payment")?;
            if !payment.amount.is_positive() {
                return Err(MortgageError::InvalidInput {
                    message: format!("extra payment on {} must be positive, got {}", payment.date, payment.amount),
                });
            }
        }
        for bill in settings.property.construction_installments() {
            within_horizon(bill, "construction bill")?;
        }

        let construction = if settings.property.is_new_construction() {
            Some(ConstructionAccount::new(
                settings.property.construction_installments().to_vec(),
                settings.construction_policy,
                start,
            )?)
        } else {
            None
        };

        Ok(Self {
            periods: mortgage.periods()?,
            full_months: mortgage.full_months()?,
            balances: mortgage.parts().iter().map(|part| part.principal.clone()).collect(),
            part_extras: mortgage
                .parts()
                .iter()
                .map(|part| SortedPayments::new(part.extra_payments.clone()))
                .collect(),
            mortgage_extras: SortedPayments::new(settings.extra_payments.clone()),
            construction,
            previous_rates: vec![None; mortgage.parts().len()],
            events: EventStore::new(),
            repaid: false,
            settings,
        })
    }

    pub fn run(mut self) -> Result<SimulationResult> {
        log::info!(
            "simulating {} over {} periods, {} part(s), principal {}",
            self.settings.mortgage.start_date(),
            self.periods.len(),
            self.balances.len(),
            self.settings.mortgage.principal()
        );

        let periods = std::mem::take(&mut self.periods);
        let mut months = Vec::with_capacity(periods.len());
        for (index, period) in periods.into_iter().enumerate() {
            months.push(self.step(index, period)?);
        }

        let result = SimulationResult {
            settings: self.settings,
            months,
            events: self.events,
        };
        log::info!(
            "simulation finished: interest {}, collected {}",
            result.total_interest().rounded_to_the_cent(),
            result.total_collected()
        );
        Ok(result)
    }

    fn step(&mut self, index: usize, period: PaymentPeriod) -> Result<MortgageMonthSummary> {
        let ltv = self
            .settings
            .property
            .loan_to_value(&self.balances.iter().sum())?;
        let rates = self.resolve_rates(&period, &ltv)?;
        let extras = self.extra_payments(&period, &rates);
        let remaining_months = self.remaining_months(index);

        let mut parts = Vec::with_capacity(self.balances.len());
        for (i, part) in self.settings.mortgage.parts().iter().enumerate() {
            let balance_before = self.balances[i].clone();
            let extra_total: Amount = extras[i].iter().map(|payment| &payment.amount).sum();
            let balance_after_extras = &balance_before - &extra_total;

            let principal_reduction = match remaining_months {
                // interest only until the first full month
                None => Amount::zero(),
                Some(_) if !balance_after_extras.is_positive() => Amount::zero(),
                Some(1) => balance_after_extras,
                Some(n) => part
                    .repayment_scheme
                    .principal_repayment(&balance_after_extras, &rates[i], n)?
                    .min(balance_after_extras),
            };
            let interest = interest_by_parts(
                &balance_before,
                &extras[i],
                &period,
                rates[i].day_count_convention,
                &rates[i].annual_rate,
            )?;

            parts.push(MortgagePartPayment {
                part_id: part.id,
                period,
                balance_before,
                principal_reduction,
                extra_principal_reduction: extra_total,
                interest,
                applied_rate: rates[i].clone(),
            });
        }

        for (balance, part) in self.balances.iter_mut().zip(&parts) {
            *balance = part.balance_after();
        }
        let payment = MortgagePayment::new(period, parts)?;
        let construction = self.step_construction(&period, &payment.applied_rate)?;

        log::debug!(
            "{}: ltv {}, rate {}, due {}, balance {} -> {}",
            period,
            ltv,
            payment.applied_rate.annual_rate,
            payment.total_due(),
            payment.balance_before(),
            payment.balance_after()
        );

        if !self.repaid && payment.balance_after().is_zero() {
            self.repaid = true;
            self.events.emit(SimulationEvent::MortgageRepaid {
                date: period.end_exclusive(),
            });
        }

        Ok(MortgageMonthSummary {
            month: AbsoluteMonth::from(period.start()),
            payment,
            construction,
        })
    }

    /// rates are resolved on the period start, against the opening LTV
    fn resolve_rates(&mut self, period: &PaymentPeriod, ltv: &Fraction) -> Result<Vec<ApplicableInterestRate>> {
        let mut rates = Vec::with_capacity(self.balances.len());
        for (i, part) in self.settings.mortgage.parts().iter().enumerate() {
            let rate = part.interest_rate.at(period.start(), ltv)?;
            let previous = self.previous_rates[i].replace(rate.annual_rate.clone());
            if let Some(old_rate) = previous.filter(|old_rate| *old_rate != rate.annual_rate) {
                log::info!("part {}: rate {} -> {} on {}", part.id, old_rate, rate.annual_rate, period.start());
                self.events.emit(SimulationEvent::InterestRateChanged {
                    part_id: part.id,
                    date: period.start(),
                    old_rate,
                    new_rate: rate.annual_rate.clone(),
                });
            }
            rates.push(rate);
        }
        Ok(rates)
    }

    /// Extra payments dated in `period`, per part and clamped to what is
    /// outstanding. Payments on the mortgage as a whole are spread over the
    /// parts in allocation order.
    fn extra_payments(&mut self, period: &PaymentPeriod, rates: &[ApplicableInterestRate]) -> Vec<Vec<Payment>> {
        let end = period.end_exclusive();
        let parts = self.settings.mortgage.parts();
        let mut available = self.balances.clone();
        let mut applied: Vec<Vec<Payment>> = vec![Vec::new(); parts.len()];

        for (i, cursor) in self.part_extras.iter_mut().enumerate() {
            for payment in cursor.pop_before(end) {
                let amount = payment.amount.clone().min(available[i].clone());
                if amount < payment.amount {
                    log::warn!(
                        "part {}: extra payment of {} on {} exceeds the balance, applying {}",
                        parts[i].id,
                        payment.amount,
                        payment.date,
                        amount
                    );
                    self.events.emit(SimulationEvent::ExtraPaymentClamped {
                        part_id: Some(parts[i].id),
                        date: payment.date,
                        requested: payment.amount.clone(),
                        applied: amount.clone(),
                    });
                }
                if amount.is_positive() {
                    available[i] -= &amount;
                    applied[i].push(Payment { amount, ..payment });
                }
            }
        }

        let order = allocation_order(self.settings.extra_payment_allocation, rates);
        for payment in self.mortgage_extras.pop_before(end) {
            let mut left = payment.amount.clone();
            for &i in &order {
                let amount = left.clone().min(available[i].clone());
                if amount.is_positive() {
                    available[i] -= &amount;
                    left -= &amount;
                    applied[i].push(Payment {
                        amount,
                        ..payment.clone()
                    });
                }
            }
            if left.is_positive() {
                log::warn!(
                    "extra payment of {} on {} exceeds the mortgage balance, applying {}",
                    payment.amount,
                    payment.date,
                    &payment.amount - &left
                );
                self.events.emit(SimulationEvent::ExtraPaymentClamped {
                    part_id: None,
                    date: payment.date,
                    requested: payment.amount.clone(),
                    applied: &payment.amount - &left,
                });
            }
        }

        for (i, payments) in applied.iter_mut().enumerate() {
            // routed payments may land before a part's own later ones
            payments.sort_by_key(|payment| payment.date);
            for payment in payments.iter() {
                self.events.emit(SimulationEvent::ExtraPaymentApplied {
                    part_id: parts[i].id,
                    date: payment.date,
                    amount: payment.amount.clone(),
                });
            }
        }
        applied
    }

    /// `None` for the interest-only partial first period
    fn remaining_months(&self, index: usize) -> Option<u32> {
        let offset = usize::from(self.settings.mortgage.starts_mid_month());
        let full_index = index.checked_sub(offset)?;
        Some(self.full_months - full_index as u32)
    }

    fn step_construction(
        &mut self,
        period: &PaymentPeriod,
        rate: &ApplicableInterestRate,
    ) -> Result<Option<ConstructionAccountSummary>> {
        let Some(account) = self.construction.as_mut() else {
            return Ok(None);
        };
        if account.is_settled() {
            return Ok(None);
        }

        let summary = account.step(period, rate)?;
        for bill in &summary.bills {
            self.events.emit(SimulationEvent::ConstructionBillPaid {
                date: bill.date,
                amount: bill.amount.clone(),
                description: bill.description.clone(),
            });
        }
        if let Some(end) = account.interest_end().filter(|end| period.contains(*end)) {
            self.events.emit(SimulationEvent::ConstructionInterestStopped { date: end });
        }
        Ok(Some(summary))
    }
}

/// part indices in the order they absorb a mortgage-wide extra payment
fn allocation_order(allocation: ExtraPaymentAllocation, rates: &[ApplicableInterestRate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rates.len()).collect();
    if allocation == ExtraPaymentAllocation::HighestRateFirst {
        // stable, so equal rates keep declaration order
        order.sort_by(|a, b| rates[*b].annual_rate.cmp(&rates[*a].annual_rate));
    }
    order
}
