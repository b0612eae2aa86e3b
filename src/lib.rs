pub mod config;
pub mod construction;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod mortgage;
pub mod payments;
pub mod property;
pub mod simulation;
pub mod types;

// re-export key types
pub use config::{ConstructionAccountPolicy, ExtraPaymentAllocation, SimulationSettings};
pub use construction::{ConstructionAccount, ConstructionAccountSummary};
pub use decimal::{Amount, Fraction, RoundingMode, DIVISION_PRECISION};
pub use errors::{ErrorKind, MortgageError, Result};
pub use events::{EventStore, SimulationEvent};
pub use interest::{
    interest_by_parts, ApplicableInterestRate, DayCountConvention, DynamicLtvRate, InterestRate,
    LtvRateGroup, PredictedRate,
};
pub use mortgage::{Mortgage, MortgageBuilder, MortgagePart};
pub use payments::{RepaymentScheme, SortedPayments};
pub use property::{loan_to_value, ConstructionInstallment, Property};
pub use simulation::{
    simulate, MortgageMonthSummary, MortgagePartPayment, MortgagePayment, MortgageYearSummary,
    PaymentDistribution, SimulationResult, Simulator,
};
pub use types::{AbsoluteMonth, MortgagePartId, Payment, PaymentPeriod};

// re-export external dependencies that users will need
pub use chrono;
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
