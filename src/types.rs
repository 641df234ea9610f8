use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// unique identifier for a reference rate observation
pub type ReferenceRateId = Uuid;

/// truncate a timestamp to its calendar day
pub fn to_day(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// whole calendar days from `start` to `end` (negative when `end` is earlier)
pub fn calendar_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// how a rate segment's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    /// value is the absolute annual percentage
    Fixed,
    /// value is a spread over the prevailing reference rate
    Float,
}

/// time-bounded piece of a loan's interest-rate schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSegment {
    pub start_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub rate_type: RateType,
    pub value: Rate,
}

impl RateSegment {
    pub fn fixed(start_date: DateTime<Utc>, rate: Rate) -> Self {
        Self {
            start_date,
            rate_type: RateType::Fixed,
            value: rate,
        }
    }

    pub fn float(start_date: DateTime<Utc>, spread: Rate) -> Self {
        Self {
            start_date,
            rate_type: RateType::Float,
            value: spread,
        }
    }

    pub fn is_float(&self) -> bool {
        self.rate_type == RateType::Float
    }
}

/// floating reference rate observation (MRR)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRate {
    pub id: ReferenceRateId,
    pub date: DateTime<Utc>,
    pub rate: Rate,
}

impl ReferenceRate {
    pub fn new(date: DateTime<Utc>, rate: Rate) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            rate,
        }
    }
}

/// a tracked loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub name: String,
    pub principal: Money,
    pub start_date: DateTime<Utc>,
    pub rates: Vec<RateSegment>,
}

impl Loan {
    /// create a loan, validating principal and rate schedule
    pub fn new(
        name: impl Into<String>,
        principal: Money,
        start_date: DateTime<Utc>,
        rates: Vec<RateSegment>,
    ) -> Result<Self> {
        if !principal.is_positive() {
            return Err(LoanError::InvalidPrincipal { principal });
        }
        if rates.is_empty() {
            return Err(LoanError::EmptyRateSchedule);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            principal,
            start_date,
            rates,
        })
    }

    /// rate label for summary cards, e.g. "5%" or "MRR +1.5% (Variable)"
    pub fn rate_display(&self) -> String {
        let Some(first) = self.rates.first() else {
            return "N/A".to_string();
        };

        let value = first.value.as_percent().normalize();
        let base = match first.rate_type {
            RateType::Fixed => format!("{}%", value),
            RateType::Float if value.is_sign_negative() => format!("MRR {}%", value),
            RateType::Float => format!("MRR +{}%", value),
        };

        if self.rates.len() > 1 {
            format!("{} (Variable)", base)
        } else {
            base
        }
    }
}

/// a recorded payment against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub note: Option<String>,
}

impl Payment {
    pub fn new(loan_id: LoanId, date: DateTime<Utc>, amount: Money) -> Result<Self> {
        if !amount.is_positive() {
            return Err(LoanError::InvalidPaymentAmount { amount });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            loan_id,
            date,
            amount,
            note: None,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// one computed amortization event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLog {
    pub date: NaiveDate,
    pub days_since_last: i64,
    /// portion of the payment applied to interest
    pub interest: Money,
    pub principal_paid: Money,
    /// balance after the payment, never negative
    pub remaining_principal: Money,
    /// raw payment amount, zero for the start-of-loan entry
    pub amount: Money,
    pub note: Option<String>,
    pub is_payment: bool,
    pub payment_id: Option<PaymentId>,
    /// interest generated in this period alone
    pub accrued_interest: Money,
    /// e.g. "1.99%(30)" or "1.99%(15)/2.50%(15)"
    pub rate_breakdown: String,
    /// interest still owed after this entry
    pub unpaid_interest: Money,
}
