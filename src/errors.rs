use thiserror::Error;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("loan has no rate segments")]
    EmptyRateSchedule,

    #[error("invalid principal: {principal}")]
    InvalidPrincipal {
        principal: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoanError>;
