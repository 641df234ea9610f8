use std::collections::HashMap;

use chrono::NaiveDate;

use crate::decimal::Rate;
use crate::errors::{LoanError, Result};
use crate::types::{to_day, LoanId, RateSegment, RateType, ReferenceRate};

/// rate segment with its start normalized to the calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRate {
    pub start_date: NaiveDate,
    pub rate_type: RateType,
    pub value: Rate,
}

impl ScheduledRate {
    pub fn is_float(&self) -> bool {
        self.rate_type == RateType::Float
    }
}

/// a loan's rate segments, day-normalized and sorted by start date
///
/// Never empty. Segments sharing a start date keep their input order, so the
/// later one wins lookups.
#[derive(Debug, Clone)]
pub struct RateSchedule {
    segments: Vec<ScheduledRate>,
}

impl RateSchedule {
    pub fn new(rates: &[RateSegment]) -> Result<Self> {
        if rates.is_empty() {
            return Err(LoanError::EmptyRateSchedule);
        }

        let mut segments: Vec<ScheduledRate> = rates
            .iter()
            .map(|r| ScheduledRate {
                start_date: to_day(r.start_date),
                rate_type: r.rate_type,
                value: r.value,
            })
            .collect();
        // stable: ties keep input order
        segments.sort_by_key(|s| s.start_date);

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[ScheduledRate] {
        &self.segments
    }

    /// index of the latest segment starting on or before `date`, falling back to
    /// the earliest segment when `date` precedes them all
    pub fn active_index(&self, date: NaiveDate) -> usize {
        let after = self.segments.partition_point(|s| s.start_date <= date);
        after.saturating_sub(1)
    }

    pub fn active_segment(&self, date: NaiveDate) -> &ScheduledRate {
        &self.segments[self.active_index(date)]
    }

    /// first segment start strictly after `date`
    pub fn next_start_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let after = self.segments.partition_point(|s| s.start_date <= date);
        self.segments.get(after).map(|s| s.start_date)
    }

    /// start dates claimed by more than one segment
    pub fn duplicate_start_dates(&self) -> Vec<NaiveDate> {
        let mut duplicates: Vec<NaiveDate> = self
            .segments
            .windows(2)
            .filter(|pair| pair[0].start_date == pair[1].start_date)
            .map(|pair| pair[0].start_date)
            .collect();
        duplicates.dedup();
        duplicates
    }
}

/// reference rate observations, day-normalized and sorted by date
#[derive(Debug, Clone, Default)]
pub struct ReferenceRateSeries {
    observations: Vec<(NaiveDate, Rate)>,
}

impl ReferenceRateSeries {
    pub fn new(reference_rates: &[ReferenceRate]) -> Self {
        let mut observations: Vec<(NaiveDate, Rate)> = reference_rates
            .iter()
            .map(|r| (to_day(r.date), r.rate))
            .collect();
        observations.sort_by_key(|(date, _)| *date);

        Self { observations }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// latest observation on or before `date`
    pub fn active_rate(&self, date: NaiveDate) -> Option<Rate> {
        let after = self.observations.partition_point(|(d, _)| *d <= date);
        after.checked_sub(1).map(|i| self.observations[i].1)
    }

    /// first observation date strictly after `date`
    pub fn next_date_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let after = self.observations.partition_point(|(d, _)| *d <= date);
        self.observations.get(after).map(|(d, _)| *d)
    }
}

/// memoized active-segment lookups, keyed by day and loan
#[derive(Debug, Default)]
pub struct RateCache {
    entries: HashMap<(NaiveDate, LoanId), usize>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// effective annual rate for `date`
///
/// Fixed segments return their value. Float segments add their spread to the
/// active reference rate, which counts as zero when none has been observed yet.
pub fn effective_rate(
    date: NaiveDate,
    rates: &RateSchedule,
    reference_rates: &ReferenceRateSeries,
) -> Rate {
    rate_for_segment(rates.active_segment(date), date, reference_rates)
}

/// next day on which the effective rate may change, bounded by `upper_bound`
///
/// Reference rate observations only count while the active segment floats. A
/// result that fails to advance past `date` is clamped to `upper_bound`.
pub fn next_change_date(
    date: NaiveDate,
    upper_bound: NaiveDate,
    rates: &RateSchedule,
    reference_rates: &ReferenceRateSeries,
    is_float: bool,
) -> NaiveDate {
    let mut next = rates.next_start_after(date).unwrap_or(upper_bound);

    if is_float {
        if let Some(observed) = reference_rates.next_date_after(date) {
            next = next.min(observed);
        }
    }

    if next > upper_bound || next <= date {
        next = upper_bound;
    }

    next
}

fn rate_for_segment(
    segment: &ScheduledRate,
    date: NaiveDate,
    reference_rates: &ReferenceRateSeries,
) -> Rate {
    match segment.rate_type {
        RateType::Fixed => segment.value,
        RateType::Float => {
            let reference = reference_rates.active_rate(date).unwrap_or(Rate::ZERO);
            reference + segment.value
        }
    }
}

/// resolves rates for one loan during a single ledger or prediction run
///
/// Owns its cache; create a fresh resolver per top-level call.
pub struct RateResolver<'a> {
    loan_id: LoanId,
    rates: &'a RateSchedule,
    reference_rates: &'a ReferenceRateSeries,
    cache: RateCache,
}

impl<'a> RateResolver<'a> {
    pub fn new(
        loan_id: LoanId,
        rates: &'a RateSchedule,
        reference_rates: &'a ReferenceRateSeries,
    ) -> Self {
        Self {
            loan_id,
            rates,
            reference_rates,
            cache: RateCache::new(),
        }
    }

    pub fn rates(&self) -> &RateSchedule {
        self.rates
    }

    pub fn reference_rates(&self) -> &ReferenceRateSeries {
        self.reference_rates
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// active segment for `date`, memoized
    pub fn active_segment(&mut self, date: NaiveDate) -> ScheduledRate {
        let rates = self.rates;
        let index = *self
            .cache
            .entries
            .entry((date, self.loan_id))
            .or_insert_with(|| rates.active_index(date));
        rates.segments()[index]
    }

    pub fn effective_rate(&mut self, date: NaiveDate) -> Rate {
        let segment = self.active_segment(date);
        rate_for_segment(&segment, date, self.reference_rates)
    }

    pub fn next_change_date(&mut self, date: NaiveDate, upper_bound: NaiveDate) -> NaiveDate {
        let is_float = self.active_segment(date).is_float();
        next_change_date(date, upper_bound, self.rates, self.reference_rates, is_float)
    }
}
