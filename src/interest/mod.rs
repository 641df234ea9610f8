pub mod accrual;
pub mod resolver;

use crate::decimal::{Money, Rate};

pub use accrual::{simple_interest, AccrualEngine};
pub use resolver::{
    effective_rate, next_change_date, RateCache, RateResolver, RateSchedule, ReferenceRateSeries,
    ScheduledRate,
};

/// interest accrued over one constant-rate stretch of a period
#[derive(Debug, Clone, PartialEq)]
pub struct InterestSegment {
    pub rate: Rate,
    pub days: i64,
    pub interest: Money,
}

impl InterestSegment {
    /// breakdown token, e.g. "2.50%(15)"
    pub fn token(&self) -> String {
        format!("{}({})", self.rate, self.days)
    }
}

/// interest accrued between two payment events
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodInterest {
    pub total_interest: Money,
    pub segments: Vec<InterestSegment>,
    /// e.g. "1.99%(30)" or "1.99%(15)/2.50%(15)"
    pub rate_breakdown: String,
}

impl PeriodInterest {
    pub fn from_segments(segments: Vec<InterestSegment>) -> Self {
        let total_interest = segments.iter().map(|s| s.interest).sum();
        let rate_breakdown = segments
            .iter()
            .map(InterestSegment::token)
            .collect::<Vec<_>>()
            .join("/");

        Self {
            total_interest,
            segments,
            rate_breakdown,
        }
    }

    pub fn total_days(&self) -> i64 {
        self.segments.iter().map(|s| s.days).sum()
    }
}
