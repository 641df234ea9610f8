pub mod allocation;
pub mod amortization;

pub use allocation::{allocate_payment, Allocation};
pub use amortization::{calculate_loan_series, AmortizationLedger, START_OF_LOAN_NOTE};
