pub mod config;
pub mod decimal;
pub mod errors;
pub mod history;
pub mod interest;
pub mod payments;
pub mod prediction;
pub mod summary;
pub mod types;

// re-export key types
pub use config::PredictionConfig;
pub use decimal::{Money, Rate, DAYS_PER_YEAR};
pub use errors::{LoanError, Result};
pub use history::{
    available_years, balance_series, entries_for_year, entries_within, BalancePoint,
    HistoryWindow,
};
pub use interest::{
    effective_rate, next_change_date, AccrualEngine, InterestSegment, PeriodInterest, RateCache,
    RateResolver, RateSchedule, ReferenceRateSeries,
};
pub use payments::{allocate_payment, calculate_loan_series, Allocation, AmortizationLedger};
pub use prediction::{Confidence, PayoffPrediction, PayoffPredictor};
pub use summary::LoanSummary;
pub use types::{
    Loan, LoanId, Payment, PaymentId, PaymentLog, RateSegment, RateType, ReferenceRate,
    ReferenceRateId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
