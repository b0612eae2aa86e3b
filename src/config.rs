use serde::{Deserialize, Serialize};

use crate::decimal::RoundingMode;
use crate::errors::{MortgageError, Result};
use crate::mortgage::Mortgage;
use crate::property::Property;
use crate::types::Payment;

/// how the construction account earns interest on its undrawn balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionAccountPolicy {
    /// months after the mortgage start during which interest accrues;
    /// `None` accrues until the account is empty
    pub interest_months: Option<u32>,
    /// rounding applied to each period's generated interest
    pub interest_rounding: RoundingMode,
}

impl Default for ConstructionAccountPolicy {
    fn default() -> Self {
        Self {
            interest_months: Some(12),
            interest_rounding: RoundingMode::HalfAwayFromZero,
        }
    }
}

impl ConstructionAccountPolicy {
    pub fn unlimited() -> Self {
        Self {
            interest_months: None,
            ..Self::default()
        }
    }

    pub fn with_interest_months(months: u32) -> Self {
        Self {
            interest_months: Some(months),
            ..Self::default()
        }
    }
}

/// which part absorbs an extra payment made on the mortgage as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtraPaymentAllocation {
    /// the part with the highest applicable rate first, ties in declaration order
    #[default]
    HighestRateFirst,
    /// parts in declaration order
    InDeclarationOrder,
}

/// everything one simulation run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub mortgage: Mortgage,
    pub property: Property,
    /// extra payments on the mortgage as a whole
    #[serde(default)]
    pub extra_payments: Vec<Payment>,
    #[serde(default)]
    pub construction_policy: ConstructionAccountPolicy,
    #[serde(default)]
    pub extra_payment_allocation: ExtraPaymentAllocation,
}

impl SimulationSettings {
    pub fn new(mortgage: Mortgage, property: Property) -> Self {
        Self {
            mortgage,
            property,
            extra_payments: Vec::new(),
            construction_policy: ConstructionAccountPolicy::default(),
            extra_payment_allocation: ExtraPaymentAllocation::default(),
        }
    }

    pub fn with_extra_payments(mut self, payments: impl IntoIterator<Item = Payment>) -> Self {
        self.extra_payments.extend(payments);
        self
    }

    pub fn with_construction_policy(mut self, policy: ConstructionAccountPolicy) -> Self {
        self.construction_policy = policy;
        self
    }

    pub fn with_extra_payment_allocation(mut self, allocation: ExtraPaymentAllocation) -> Self {
        self.extra_payment_allocation = allocation;
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MortgageError::InvalidInput {
            message: format!("cannot serialize settings: {e}"),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MortgageError::InvalidInput {
            message: format!("cannot parse settings: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Amount, Fraction};
    use crate::interest::{DayCountConvention, DynamicLtvRate, InterestRate, PredictedRate};
    use crate::mortgage::MortgagePart;
    use crate::payments::RepaymentScheme;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn settings() -> SimulationSettings {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mortgage = Mortgage::builder()
            .start_date(start)
            .term_in_years(30)
            .part(MortgagePart::new(
                Amount::from_major(250_000),
                InterestRate::fixed(Fraction::from_percentage(dec!(4.1)), DayCountConvention::ThirtyE360),
                RepaymentScheme::Annuity,
            ))
            .build()
            .unwrap();
        let property = Property::Existing {
            purchase: Payment::new(start, Amount::from_major(300_000)),
            appraised_value: Amount::from_major(310_000),
        };
        SimulationSettings::new(mortgage, property)
    }

    #[test]
    fn test_default_policy_caps_interest_at_twelve_months() {
        let policy = ConstructionAccountPolicy::default();
        assert_eq!(policy.interest_months, Some(12));
        assert_eq!(policy.interest_rounding, RoundingMode::HalfAwayFromZero);
        assert_eq!(ConstructionAccountPolicy::unlimited().interest_months, None);
        assert_eq!(ConstructionAccountPolicy::with_interest_months(9).interest_months, Some(9));
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = settings().with_extra_payments([Payment::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            Amount::from_major(10_000),
        )
        .with_description("bonus")]);
        let json = settings.to_json().unwrap();
        assert!(json.contains("\"ThirtyE360\""));
        assert_eq!(SimulationSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_missing_optional_sections_use_defaults() {
        let json = settings().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("extra_payments");
        object.remove("construction_policy");
        object.remove("extra_payment_allocation");
        let parsed = SimulationSettings::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed.construction_policy, ConstructionAccountPolicy::default());
        assert_eq!(parsed.extra_payment_allocation, ExtraPaymentAllocation::HighestRateFirst);
    }

    fn predicted_settings() -> SimulationSettings {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rate = PredictedRate::new(
            NaiveDate::from_ymd_opt(2029, 1, 1).unwrap(),
            InterestRate::fixed(Fraction::from_percentage(dec!(3.5)), DayCountConvention::ThirtyE360),
            InterestRate::from(
                DynamicLtvRate::new(
                    vec![(Fraction::from_percentage(dec!(80)), Fraction::from_percentage(dec!(3.9)))],
                    Fraction::from_percentage(dec!(4.2)),
                    DayCountConvention::ThirtyE360,
                )
                .unwrap(),
            ),
        )
        .unwrap();
        let mortgage = Mortgage::builder()
            .start_date(start)
            .term_in_years(30)
            .part(MortgagePart::new(
                Amount::from_major(250_000),
                InterestRate::Predicted(rate),
                RepaymentScheme::Annuity,
            ))
            .build()
            .unwrap();
        let property = Property::Existing {
            purchase: Payment::new(start, Amount::from_major(300_000)),
            appraised_value: Amount::from_major(310_000),
        };
        SimulationSettings::new(mortgage, property)
    }

    #[test]
    fn test_predicted_rate_settings_round_trip() {
        let settings = predicted_settings();
        let json = settings.to_json().unwrap();
        assert_eq!(SimulationSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_tampered_future_convention_is_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&predicted_settings().to_json().unwrap()).unwrap();
        let future = &mut value["mortgage"]["parts"][0]["interest_rate"]["Predicted"]["future"]["DynamicLtv"];
        assert_eq!(future["day_count_convention"], "ThirtyE360");
        future["day_count_convention"] = serde_json::json!("ActualActual");

        let error = SimulationSettings::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(error, MortgageError::InvalidInput { .. }));
        assert!(error.to_string().contains("mismatched day count conventions"), "{error}");
    }

    #[test]
    fn test_tampered_ltv_tiers_are_rejected() {
        let value: serde_json::Value = serde_json::from_str(&predicted_settings().to_json().unwrap()).unwrap();
        let groups = value["mortgage"]["parts"][0]["interest_rate"]["Predicted"]["future"]["DynamicLtv"]["groups"].clone();
        assert_eq!(groups.as_array().map(Vec::len), Some(2));

        // drop the unconditioned tier
        let mut missing_open_tier = value.clone();
        missing_open_tier["mortgage"]["parts"][0]["interest_rate"]["Predicted"]["future"]["DynamicLtv"]["groups"] =
            serde_json::json!([groups[0].clone()]);
        assert!(SimulationSettings::from_json(&missing_open_tier.to_string()).is_err());

        // open tier first
        let mut reversed = value;
        reversed["mortgage"]["parts"][0]["interest_rate"]["Predicted"]["future"]["DynamicLtv"]["groups"] =
            serde_json::json!([groups[1].clone(), groups[0].clone()]);
        assert!(SimulationSettings::from_json(&reversed.to_string()).is_err());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            SimulationSettings::from_json("{"),
            Err(MortgageError::InvalidInput { .. })
        ));
    }
}
