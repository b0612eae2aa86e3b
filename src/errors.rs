use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::Fraction;
use crate::interest::DayCountConvention;
use crate::payments::RepaymentScheme;

/// broad category of a failure, all of which abort a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Arithmetic,
    Configuration,
    InputValidation,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MortgageError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid format scale: {scale}")]
    InvalidScale {
        scale: i32,
    },

    #[error("repayment scheme {scheme:?} is incompatible with day count convention {convention:?}")]
    IncompatibleConvention {
        scheme: RepaymentScheme,
        convention: DayCountConvention,
    },

    #[error("mismatched day count conventions: expected {expected:?}, found {found:?}")]
    MismatchedConventions {
        expected: DayCountConvention,
        found: DayCountConvention,
    },

    #[error("no interest rate tier matches loan-to-value ratio {ltv}")]
    UnresolvedInterestRate {
        ltv: Fraction,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid month: {month}")]
    InvalidMonth {
        month: u32,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid period: {start} is not before {end_exclusive}")]
    InvalidPeriod {
        start: NaiveDate,
        end_exclusive: NaiveDate,
    },

    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },
}

impl MortgageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MortgageError::DivisionByZero
            | MortgageError::InvalidScale { .. } => ErrorKind::Arithmetic,
            MortgageError::IncompatibleConvention { .. }
            | MortgageError::MismatchedConventions { .. }
            | MortgageError::UnresolvedInterestRate { .. }
            | MortgageError::InvalidConfiguration { .. } => ErrorKind::Configuration,
            MortgageError::InvalidMonth { .. }
            | MortgageError::InvalidDate { .. }
            | MortgageError::InvalidPeriod { .. }
            | MortgageError::InvalidInput { .. } => ErrorKind::InputValidation,
        }
    }
}

pub type Result<T> = std::result::Result<T, MortgageError>;
