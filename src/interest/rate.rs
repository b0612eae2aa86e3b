use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Fraction;
use crate::errors::{MortgageError, Result};
use crate::interest::DayCountConvention;

/// annual rate together with the convention used to prorate it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicableInterestRate {
    pub annual_rate: Fraction,
    pub day_count_convention: DayCountConvention,
}

impl ApplicableInterestRate {
    pub fn new(annual_rate: Fraction, day_count_convention: DayCountConvention) -> Self {
        Self {
            annual_rate,
            day_count_convention,
        }
    }

    /// annual rate / 12
    pub fn monthly_rate(&self) -> Result<Fraction> {
        self.annual_rate.divide_by(12)
    }
}

/// source of the interest rate applicable to a mortgage part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterestRate {
    Fixed(ApplicableInterestRate),
    DynamicLtv(DynamicLtvRate),
    Predicted(PredictedRate),
}

impl InterestRate {
    pub fn fixed(annual_rate: Fraction, convention: DayCountConvention) -> Self {
        InterestRate::Fixed(ApplicableInterestRate::new(annual_rate, convention))
    }

    /// resolve the rate applicable on `date` for the given loan-to-value ratio
    pub fn at(&self, date: NaiveDate, ltv: &Fraction) -> Result<ApplicableInterestRate> {
        match self {
            InterestRate::Fixed(rate) => Ok(rate.clone()),
            InterestRate::DynamicLtv(rate) => rate.at(ltv),
            InterestRate::Predicted(rate) => rate.at(date, ltv),
        }
    }

    pub fn day_count_convention(&self) -> DayCountConvention {
        match self {
            InterestRate::Fixed(rate) => rate.day_count_convention,
            InterestRate::DynamicLtv(rate) => rate.day_count_convention,
            InterestRate::Predicted(rate) => rate.initial.day_count_convention(),
        }
    }
}

/// one tier of an LTV-dependent rate; `max_ltv` of `None` matches any ratio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LtvRateGroup {
    pub max_ltv: Option<Fraction>,
    pub annual_rate: Fraction,
}

/// rate tiered by loan-to-value ratio, thresholds ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DynamicLtvRateParts")]
pub struct DynamicLtvRate {
    groups: Vec<LtvRateGroup>,
    day_count_convention: DayCountConvention,
}

#[derive(Deserialize)]
struct DynamicLtvRateParts {
    groups: Vec<LtvRateGroup>,
    day_count_convention: DayCountConvention,
}

impl TryFrom<DynamicLtvRateParts> for DynamicLtvRate {
    type Error = MortgageError;

    /// stored groups are the tiers followed by exactly one unconditioned group
    fn try_from(parts: DynamicLtvRateParts) -> Result<Self> {
        let mut groups = parts.groups;
        let unconditioned = match groups.pop() {
            Some(LtvRateGroup { max_ltv: None, annual_rate }) => annual_rate,
            _ => {
                return Err(MortgageError::InvalidConfiguration {
                    message: "the last ltv group must have no threshold".to_string(),
                })
            }
        };
        let tiers = groups
            .into_iter()
            .map(|group| match group.max_ltv {
                Some(max_ltv) => Ok((max_ltv, group.annual_rate)),
                None => Err(MortgageError::InvalidConfiguration {
                    message: "only the last ltv group may have no threshold".to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        DynamicLtvRate::new(tiers, unconditioned, parts.day_count_convention)
    }
}

impl DynamicLtvRate {
    /// tiers of `(max_ltv, rate)` in strictly ascending threshold order,
    /// followed by the rate used above the highest threshold
    pub fn new(
        tiers: Vec<(Fraction, Fraction)>,
        unconditioned_rate: Fraction,
        day_count_convention: DayCountConvention,
    ) -> Result<Self> {
        if let Some(pair) = tiers.windows(2).find(|pair| pair[0].0 >= pair[1].0) {
            return Err(MortgageError::InvalidConfiguration {
                message: format!(
                    "ltv thresholds must be strictly ascending, {} is followed by {}",
                    pair[0].0, pair[1].0
                ),
            });
        }

        let mut groups: Vec<LtvRateGroup> = tiers
            .into_iter()
            .map(|(max_ltv, annual_rate)| LtvRateGroup {
                max_ltv: Some(max_ltv),
                annual_rate,
            })
            .collect();
        groups.push(LtvRateGroup {
            max_ltv: None,
            annual_rate: unconditioned_rate,
        });

        Ok(Self {
            groups,
            day_count_convention,
        })
    }

    pub fn from_map(
        tiers: &BTreeMap<Fraction, Fraction>,
        unconditioned_rate: Fraction,
        day_count_convention: DayCountConvention,
    ) -> Result<Self> {
        Self::new(
            tiers.iter().map(|(ltv, rate)| (ltv.clone(), rate.clone())).collect(),
            unconditioned_rate,
            day_count_convention,
        )
    }

    pub fn groups(&self) -> &[LtvRateGroup] {
        &self.groups
    }

    pub fn at(&self, ltv: &Fraction) -> Result<ApplicableInterestRate> {
        self.groups
            .iter()
            .find(|group| group.max_ltv.as_ref().map_or(true, |max| max >= ltv))
            .map(|group| ApplicableInterestRate::new(group.annual_rate.clone(), self.day_count_convention))
            .ok_or_else(|| MortgageError::UnresolvedInterestRate { ltv: ltv.clone() })
    }
}

/// rate that switches from `initial` to `future` on `change_date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PredictedRateParts")]
pub struct PredictedRate {
    change_date: NaiveDate,
    initial: Box<InterestRate>,
    future: Box<InterestRate>,
}

#[derive(Deserialize)]
struct PredictedRateParts {
    change_date: NaiveDate,
    initial: Box<InterestRate>,
    future: Box<InterestRate>,
}

impl TryFrom<PredictedRateParts> for PredictedRate {
    type Error = MortgageError;

    fn try_from(parts: PredictedRateParts) -> Result<Self> {
        PredictedRate::new(parts.change_date, *parts.initial, *parts.future)
    }
}

impl PredictedRate {
    pub fn new(change_date: NaiveDate, initial: InterestRate, future: InterestRate) -> Result<Self> {
        let expected = initial.day_count_convention();
        let found = future.day_count_convention();
        if expected != found {
            return Err(MortgageError::MismatchedConventions { expected, found });
        }
        Ok(Self {
            change_date,
            initial: Box::new(initial),
            future: Box::new(future),
        })
    }

    pub fn change_date(&self) -> NaiveDate {
        self.change_date
    }

    pub fn at(&self, date: NaiveDate, ltv: &Fraction) -> Result<ApplicableInterestRate> {
        if date < self.change_date {
            self.initial.at(date, ltv)
        } else {
            self.future.at(date, ltv)
        }
    }
}

impl From<DynamicLtvRate> for InterestRate {
    fn from(rate: DynamicLtvRate) -> Self {
        InterestRate::DynamicLtv(rate)
    }
}

impl From<PredictedRate> for InterestRate {
    fn from(rate: PredictedRate) -> Self {
        InterestRate::Predicted(rate)
    }
}
