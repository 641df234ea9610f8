use chrono::NaiveDate;
use log::trace;

use crate::decimal::{Money, Rate};
use crate::interest::resolver::RateResolver;
use crate::interest::{InterestSegment, PeriodInterest};
use crate::types::calendar_days_between;

/// engine for accruing simple interest across rate changes
///
/// Principal is constant for the whole period: it only moves at payment
/// events, and payments bound every period.
pub struct AccrualEngine<'r, 'a> {
    resolver: &'r mut RateResolver<'a>,
}

impl<'r, 'a> AccrualEngine<'r, 'a> {
    pub fn new(resolver: &'r mut RateResolver<'a>) -> Self {
        Self { resolver }
    }

    /// accrue interest on `principal` over `[period_start, period_end)`
    pub fn accrue(
        &mut self,
        period_start: NaiveDate,
        period_end: NaiveDate,
        principal: Money,
    ) -> PeriodInterest {
        let mut cursor = period_start;
        let mut segments = Vec::new();

        while cursor < period_end {
            let rate = self.resolver.effective_rate(cursor);
            let next = self.resolver.next_change_date(cursor, period_end);
            if next <= cursor {
                break;
            }

            let days = calendar_days_between(cursor, next);
            if days > 0 {
                let interest = principal.apply_rate(rate, days);
                trace!(
                    "accrued {} on {} at {} for {} days from {}",
                    interest, principal, rate, days, cursor
                );
                segments.push(InterestSegment { rate, days, interest });
            }

            cursor = next;
        }

        PeriodInterest::from_segments(segments)
    }
}

/// accrue interest over a single constant-rate stretch
pub fn simple_interest(principal: Money, annual_rate: Rate, days: i64) -> Money {
    principal.apply_rate(annual_rate, days)
}
