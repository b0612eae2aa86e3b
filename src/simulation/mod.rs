pub mod engine;
pub mod payment;
pub mod result;

pub use engine::{simulate, Simulator};
pub use payment::{MortgagePartPayment, MortgagePayment};
pub use result::{MortgageMonthSummary, MortgageYearSummary, PaymentDistribution, SimulationResult};
