pub mod accrual;
pub mod day_count;
pub mod rate;

pub use accrual::{interest_by_parts, interest_segments, simple_interest, InterestSegment};
pub use day_count::DayCountConvention;
pub use rate::{ApplicableInterestRate, DynamicLtvRate, InterestRate, LtvRateGroup, PredictedRate};
