use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::PaymentLog;

/// trailing period for the balance graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryWindow {
    All,
    OneYear,
    SixMonths,
    ThreeMonths,
    OneMonth,
}

impl HistoryWindow {
    pub fn months(&self) -> Option<u32> {
        match self {
            HistoryWindow::All => None,
            HistoryWindow::OneYear => Some(12),
            HistoryWindow::SixMonths => Some(6),
            HistoryWindow::ThreeMonths => Some(3),
            HistoryWindow::OneMonth => Some(1),
        }
    }

    /// earliest date inside the window, `None` when unbounded
    pub fn cutoff(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        self.months()
            .map(|m| as_of.checked_sub_months(Months::new(m)).unwrap_or(NaiveDate::MIN))
    }
}

/// one point on the balance graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: Money,
    pub interest_paid: Money,
}

/// distinct years that contain a payment, newest first
pub fn available_years(entries: &[PaymentLog]) -> Vec<i32> {
    let mut years: Vec<i32> = entries
        .iter()
        .filter(|e| e.is_payment)
        .map(|e| e.date.year())
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

pub fn entries_for_year(entries: &[PaymentLog], year: i32) -> Vec<&PaymentLog> {
    entries.iter().filter(|e| e.date.year() == year).collect()
}

/// entries dated strictly after the window's cutoff
///
/// The cutoff day itself is excluded: `as_of` stands for a moment during that
/// day, so an entry at midnight on the cutoff day is already out of range.
pub fn entries_within(
    entries: &[PaymentLog],
    window: HistoryWindow,
    as_of: NaiveDate,
) -> Vec<&PaymentLog> {
    match window.cutoff(as_of) {
        None => entries.iter().collect(),
        Some(cutoff) => entries.iter().filter(|e| e.date > cutoff).collect(),
    }
}

/// chart series with amounts rounded half up to 2 dp
pub fn balance_series<'a, I>(entries: I) -> Vec<BalancePoint>
where
    I: IntoIterator<Item = &'a PaymentLog>,
{
    entries
        .into_iter()
        .map(|e| BalancePoint {
            date: e.date,
            balance: e.remaining_principal.round_half_up(2),
            interest_paid: e.interest.round_half_up(2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::payments::AmortizationLedger;
    use crate::types::{Loan, Payment, RateSegment};
    use chrono::{TimeZone, Utc};

    fn entry(y: i32, m: u32, d: u32, is_payment: bool) -> PaymentLog {
        PaymentLog {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            days_since_last: 0,
            interest: Money::from_str_exact("12.345").unwrap(),
            principal_paid: Money::ZERO,
            remaining_principal: Money::from_str_exact("999.999").unwrap(),
            amount: Money::ZERO,
            note: None,
            is_payment,
            payment_id: None,
            accrued_interest: Money::ZERO,
            rate_breakdown: String::new(),
            unpaid_interest: Money::ZERO,
        }
    }

    fn ledger() -> Vec<PaymentLog> {
        vec![
            entry(2022, 12, 1, false),
            entry(2023, 3, 1, true),
            entry(2023, 9, 1, true),
            entry(2024, 5, 1, true),
            entry(2024, 6, 20, true),
        ]
    }

    #[test]
    fn test_available_years() {
        assert_eq!(available_years(&ledger()), vec![2024, 2023]);
    }

    #[test]
    fn test_entries_for_year() {
        let entries = ledger();
        let year = entries_for_year(&entries, 2023);
        assert_eq!(year.len(), 2);
        assert!(year.iter().all(|e| e.date.year() == 2023));
    }

    #[test]
    fn test_entries_within_window() {
        let entries = ledger();
        let as_of = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        assert_eq!(entries_within(&entries, HistoryWindow::All, as_of).len(), 5);
        assert_eq!(entries_within(&entries, HistoryWindow::OneYear, as_of).len(), 3);
        assert_eq!(entries_within(&entries, HistoryWindow::SixMonths, as_of).len(), 2);
        assert_eq!(entries_within(&entries, HistoryWindow::ThreeMonths, as_of).len(), 2);
        assert_eq!(entries_within(&entries, HistoryWindow::OneMonth, as_of).len(), 1);
    }

    #[test]
    fn test_entry_on_cutoff_day_is_excluded() {
        let entries = ledger();
        // one month back from 2024-06-01 is 2024-05-01, the date of an entry
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let within = entries_within(&entries, HistoryWindow::OneMonth, as_of);
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].date, NaiveDate::from_ymd_opt(2024, 6, 20).unwrap());

        let day_before = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert_eq!(entries_within(&entries, HistoryWindow::OneMonth, day_before).len(), 2);
    }

    #[test]
    fn test_month_end_cutoff() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            HistoryWindow::OneMonth.cutoff(as_of),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_balance_series_rounds() {
        let entries = ledger();
        let series = balance_series(&entries);

        assert_eq!(series.len(), 5);
        assert_eq!(series[0].balance, Money::from_major(1_000));
        assert_eq!(series[0].interest_paid, Money::from_str_exact("12.35").unwrap());
    }

    #[test]
    fn test_balance_series_midpoint_rounds_up() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let loan = Loan::new(
            "midpoint",
            Money::from_str_exact("1000.125").unwrap(),
            start,
            vec![RateSegment::fixed(start, Rate::ZERO)],
        )
        .unwrap();
        let payment = Payment::new(
            loan.id,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Money::from_str_exact("0.5").unwrap(),
        )
        .unwrap();

        let ledger = AmortizationLedger::build(&loan, &[payment], &[]).unwrap();
        let series = balance_series(&ledger.entries);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].balance, Money::from_str_exact("1000.13").unwrap());
        assert_eq!(series[1].balance, Money::from_str_exact("999.63").unwrap());
        assert_eq!(series[1].interest_paid, Money::ZERO);
    }
}
