use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::{AccrualEngine, RateResolver, RateSchedule, ReferenceRateSeries};
use crate::payments::allocation::allocate_payment;
use crate::summary::LoanSummary;
use crate::types::{calendar_days_between, to_day, Loan, LoanId, Payment, PaymentLog, ReferenceRate};

/// note attached to the synthetic first ledger entry
pub const START_OF_LOAN_NOTE: &str = "Start of Loan";

/// build the amortization ledger for a loan from its payment history
///
/// The ledger is recomputed from scratch on every call. Returns an empty ledger
/// when there is no loan. Payments dated before the loan start are skipped.
pub fn calculate_loan_series(
    loan: Option<&Loan>,
    payments: &[Payment],
    reference_rates: &[ReferenceRate],
) -> Result<Vec<PaymentLog>> {
    let Some(loan) = loan else {
        return Ok(Vec::new());
    };

    let rates = RateSchedule::new(&loan.rates)?;
    for date in rates.duplicate_start_dates() {
        warn!(
            "loan {} has several rate segments starting {}; the last one listed applies",
            loan.id, date
        );
    }
    let reference = ReferenceRateSeries::new(reference_rates);
    let mut resolver = RateResolver::new(loan.id, &rates, &reference);

    // stable: same-day payments keep their recorded order
    let mut ordered: Vec<&Payment> = payments.iter().collect();
    ordered.sort_by_key(|p| p.date);

    let mut current_principal = loan.principal;
    let mut last_date = to_day(loan.start_date);
    let mut unpaid_interest = Money::ZERO;

    let mut logs = Vec::with_capacity(ordered.len() + 1);
    logs.push(PaymentLog {
        date: last_date,
        days_since_last: 0,
        interest: Money::ZERO,
        principal_paid: Money::ZERO,
        remaining_principal: current_principal,
        amount: Money::ZERO,
        note: Some(START_OF_LOAN_NOTE.to_string()),
        is_payment: false,
        payment_id: None,
        accrued_interest: Money::ZERO,
        rate_breakdown: String::new(),
        unpaid_interest: Money::ZERO,
    });

    for payment in ordered {
        let pay_date = to_day(payment.date);
        if pay_date < last_date {
            debug!("skipping payment {} dated {} before {}", payment.id, pay_date, last_date);
            continue;
        }

        let days = calendar_days_between(last_date, pay_date);
        let period =
            AccrualEngine::new(&mut resolver).accrue(last_date, pay_date, current_principal);
        let allocation = allocate_payment(payment.amount, period.total_interest, unpaid_interest);

        current_principal = (current_principal - allocation.principal_paid).max(Money::ZERO);
        unpaid_interest = allocation.unpaid_interest;

        logs.push(PaymentLog {
            date: pay_date,
            days_since_last: days,
            interest: allocation.interest_paid,
            principal_paid: allocation.principal_paid,
            remaining_principal: current_principal,
            amount: payment.amount,
            note: payment.note.clone(),
            is_payment: true,
            payment_id: Some(payment.id),
            accrued_interest: period.total_interest,
            rate_breakdown: period.rate_breakdown,
            unpaid_interest,
        });

        last_date = pay_date;
    }

    debug!("built ledger for loan {} with {} entries", loan.id, logs.len());
    Ok(logs)
}

/// computed ledger for one loan plus running totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationLedger {
    pub loan_id: LoanId,
    pub principal: Money,
    pub entries: Vec<PaymentLog>,
}

impl AmortizationLedger {
    /// build the ledger for `loan`
    pub fn build(
        loan: &Loan,
        payments: &[Payment],
        reference_rates: &[ReferenceRate],
    ) -> Result<Self> {
        let entries = calculate_loan_series(Some(loan), payments, reference_rates)?;

        Ok(Self {
            loan_id: loan.id,
            principal: loan.principal,
            entries,
        })
    }

    /// entries backed by a real payment
    pub fn payments(&self) -> impl Iterator<Item = &PaymentLog> {
        self.entries.iter().filter(|e| e.is_payment)
    }

    pub fn payment_count(&self) -> usize {
        self.payments().count()
    }

    pub fn last_entry(&self) -> Option<&PaymentLog> {
        self.entries.last()
    }

    pub fn last_payment_date(&self) -> Option<NaiveDate> {
        self.payments().last().map(|e| e.date)
    }

    pub fn current_balance(&self) -> Money {
        self.last_entry()
            .map(|e| e.remaining_principal)
            .unwrap_or(self.principal)
    }

    /// interest accrued but not yet paid
    pub fn outstanding_interest(&self) -> Money {
        self.last_entry().map(|e| e.unpaid_interest).unwrap_or(Money::ZERO)
    }

    pub fn total_interest_paid(&self) -> Money {
        self.entries.iter().map(|e| e.interest).sum()
    }

    pub fn total_principal_paid(&self) -> Money {
        self.entries.iter().map(|e| e.principal_paid).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }

    pub fn total_interest_accrued(&self) -> Money {
        self.entries.iter().map(|e| e.accrued_interest).sum()
    }

    pub fn summary(&self, loan: &Loan) -> LoanSummary {
        LoanSummary::from_ledger(loan, self)
    }
}
