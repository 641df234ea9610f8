use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::payments::AmortizationLedger;
use crate::types::{Loan, LoanId};

/// headline figures for a loan's summary cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    pub name: String,
    pub original_principal: Money,
    pub remaining_principal: Money,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    pub total_paid: Money,
    pub outstanding_interest: Money,
    pub payment_count: usize,
    pub rate_display: String,
}

impl LoanSummary {
    pub fn from_ledger(loan: &Loan, ledger: &AmortizationLedger) -> Self {
        Self {
            loan_id: loan.id,
            name: loan.name.clone(),
            original_principal: loan.principal,
            remaining_principal: ledger.current_balance(),
            total_interest_paid: ledger.total_interest_paid(),
            total_principal_paid: ledger.total_principal_paid(),
            total_paid: ledger.total_paid(),
            outstanding_interest: ledger.outstanding_interest(),
            payment_count: ledger.payment_count(),
            rate_display: loan.rate_display(),
        }
    }

    /// share of the original principal repaid, in percent
    pub fn percent_repaid(&self) -> Decimal {
        if self.original_principal.is_zero() {
            return Decimal::ZERO;
        }
        let repaid = self.original_principal - self.remaining_principal;
        (repaid.as_decimal() * Decimal::from(100) / self.original_principal.as_decimal())
            .round_dp(2)
    }

    pub fn is_paid_off(&self) -> bool {
        self.remaining_principal.is_zero()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
