use chrono::{DateTime, Duration, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::PredictionConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::interest::{RateResolver, RateSchedule, ReferenceRateSeries};
use crate::types::{calendar_days_between, to_day, Loan, Payment, ReferenceRate};

/// how far the payment trend can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn downgrade(self) -> Self {
        match self {
            Confidence::High => Confidence::Medium,
            Confidence::Medium | Confidence::Low => Confidence::Low,
        }
    }
}

/// estimated payoff based on recent payment behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPrediction {
    pub average_payment: Money,
    pub average_days_between_payments: Decimal,
    pub current_rate: Rate,
    pub estimated_months_left: u32,
    pub estimated_years_left: Decimal,
    pub estimated_payoff_date: DateTime<Utc>,
    pub total_estimated_interest: Money,
    pub confidence: Confidence,
}

/// projects the remaining balance forward at the recent payment trend
#[derive(Debug, Clone, Default)]
pub struct PayoffPredictor {
    config: PredictionConfig,
}

impl PayoffPredictor {
    pub fn new(config: PredictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// predict using the system clock
    pub fn predict_now(
        &self,
        loan: &Loan,
        payments: &[Payment],
        current_balance: Money,
        reference_rates: &[ReferenceRate],
    ) -> Result<Option<PayoffPrediction>> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.predict(loan, payments, current_balance, reference_rates, &time)
    }

    /// predict as of the provider's current time
    pub fn predict(
        &self,
        loan: &Loan,
        payments: &[Payment],
        current_balance: Money,
        reference_rates: &[ReferenceRate],
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<PayoffPrediction>> {
        self.predict_at(loan, payments, current_balance, reference_rates, time_provider.now())
    }

    /// predict as of `as_of`
    ///
    /// Returns `None` when there are too few payments, nothing is owed, or the
    /// average payment does not cover accruing interest.
    pub fn predict_at(
        &self,
        loan: &Loan,
        payments: &[Payment],
        current_balance: Money,
        reference_rates: &[ReferenceRate],
        as_of: DateTime<Utc>,
    ) -> Result<Option<PayoffPrediction>> {
        if payments.len() < self.config.min_payments {
            debug!("no payoff prediction for loan {}: only {} payments", loan.id, payments.len());
            return Ok(None);
        }
        if !current_balance.is_positive() {
            debug!("no payoff prediction for loan {}: balance is {}", loan.id, current_balance);
            return Ok(None);
        }

        let recent = self.recent_payments(payments);
        let amounts: Vec<Decimal> = recent.iter().map(|p| p.amount.as_decimal()).collect();
        let average_payment = mean(&amounts);
        let average_gap = self.average_gap_days(&recent);

        let rates = RateSchedule::new(&loan.rates)?;
        let reference = ReferenceRateSeries::new(reference_rates);
        let current_rate =
            RateResolver::new(loan.id, &rates, &reference).effective_rate(to_day(as_of));
        let daily_rate = current_rate.daily_fraction();

        let threshold = self.config.payoff_threshold.as_decimal();
        let mut balance = current_balance.as_decimal();
        let mut total_interest = Decimal::ZERO;
        let mut elapsed_days = Decimal::ZERO;
        let mut months = Decimal::ZERO;
        let mut iterations = 0;

        while balance > threshold && iterations < self.config.max_iterations {
            let interest = balance * daily_rate * average_gap;
            let principal = (average_payment - interest).min(balance);
            if principal <= Decimal::ZERO {
                debug!(
                    "no payoff prediction for loan {}: average payment {} does not cover \
                     interest {}",
                    loan.id, average_payment, interest
                );
                return Ok(None);
            }

            balance -= principal;
            total_interest += interest;
            elapsed_days += average_gap;
            months += average_gap / self.config.days_per_month;
            iterations += 1;
        }

        let estimated_months_left = months
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .ok_or_else(|| LoanError::CalculationError {
                message: format!("months left out of range: {}", months),
            })?;
        let estimated_years_left = (months / Decimal::from(12))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        let payoff_days = elapsed_days
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| LoanError::CalculationError {
                message: format!("payoff horizon out of range: {} days", elapsed_days),
            })?;

        let confidence = self.confidence(&amounts, average_payment);
        debug!(
            "loan {} predicted paid off in {} months ({:?} confidence)",
            loan.id, estimated_months_left, confidence
        );

        Ok(Some(PayoffPrediction {
            average_payment: Money::from_decimal(average_payment),
            average_days_between_payments: average_gap,
            current_rate,
            estimated_months_left,
            estimated_years_left,
            estimated_payoff_date: as_of + Duration::days(payoff_days),
            total_estimated_interest: Money::from_decimal(total_interest),
            confidence,
        }))
    }

    /// up to `recent_window` latest payments, oldest first
    fn recent_payments<'p>(&self, payments: &'p [Payment]) -> Vec<&'p Payment> {
        let mut latest: Vec<&Payment> = payments.iter().collect();
        latest.sort_by(|a, b| b.date.cmp(&a.date));
        latest.truncate(self.config.recent_window);
        latest.reverse();
        latest
    }

    fn average_gap_days(&self, recent: &[&Payment]) -> Decimal {
        let mut dates: Vec<_> = recent.iter().map(|p| to_day(p.date)).collect();
        if dates.len() < 2 {
            return self.config.default_gap_days;
        }
        dates.sort();

        let gaps: Vec<Decimal> = dates
            .windows(2)
            .map(|pair| Decimal::from(calendar_days_between(pair[0], pair[1])))
            .collect();
        mean(&gaps)
    }

    fn confidence(&self, amounts: &[Decimal], average: Decimal) -> Confidence {
        let count = amounts.len();
        let base = if count >= self.config.high_confidence_payments {
            Confidence::High
        } else if count >= self.config.medium_confidence_payments {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        if coefficient_of_variation(amounts, average) > self.config.variation_threshold {
            base.downgrade()
        } else {
            base
        }
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

/// population standard deviation over mean
fn coefficient_of_variation(values: &[Decimal], average: Decimal) -> Decimal {
    if values.is_empty() || average.is_zero() {
        return Decimal::ZERO;
    }

    let variance = values
        .iter()
        .map(|v| (*v - average) * (*v - average))
        .sum::<Decimal>()
        / Decimal::from(values.len());
    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);
    std_dev / average
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RateSegment;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use test_log::test;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn loan(rate: Rate) -> Loan {
        Loan::new(
            "home",
            Money::from_major(100_000),
            at(2023, 1, 1),
            vec![RateSegment::fixed(at(2023, 1, 1), rate)],
        )
        .unwrap()
    }

    /// monthly payments on the first of each month, starting february 2023
    fn monthly(loan: &Loan, amounts: &[i64]) -> Vec<Payment> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                let date = at(2023, 2, 1) + Duration::days(30 * i as i64);
                Payment::new(loan.id, date, Money::from_major(*amount)).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_too_few_payments() {
        let loan = loan(Rate::from_percentage(5));
        let payments = monthly(&loan, &[2_000, 2_000]);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(90_000), &[], at(2024, 1, 1))
            .unwrap();
        assert!(prediction.is_none());
    }

    #[test]
    fn test_no_balance() {
        let loan = loan(Rate::from_percentage(5));
        let payments = monthly(&loan, &[2_000, 2_000, 2_000]);
        let predictor = PayoffPredictor::default();

        assert!(predictor
            .predict_at(&loan, &payments, Money::ZERO, &[], at(2024, 1, 1))
            .unwrap()
            .is_none());
        assert!(predictor
            .predict_at(&loan, &payments, Money::from_major(-5), &[], at(2024, 1, 1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_payment_below_interest_never_pays_off() {
        let loan = loan(Rate::from_percentage(12));
        // 100k at 12% accrues ~986 per 30 days
        let payments = monthly(&loan, &[500, 500, 500]);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(100_000), &[], at(2024, 1, 1))
            .unwrap();
        assert!(prediction.is_none());
    }

    #[test]
    fn test_zero_rate_linear_payoff() {
        let loan = loan(Rate::ZERO);
        let payments = monthly(&loan, &[1_000, 1_000, 1_000]);
        let as_of = at(2024, 1, 1);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(12_000), &[], as_of)
            .unwrap()
            .unwrap();

        assert_eq!(prediction.average_payment, Money::from_major(1_000));
        assert_eq!(prediction.average_days_between_payments, dec!(30));
        assert_eq!(prediction.estimated_months_left, 12);
        assert_eq!(prediction.estimated_years_left, dec!(1.0));
        assert_eq!(prediction.estimated_payoff_date, as_of + Duration::days(360));
        assert_eq!(prediction.total_estimated_interest, Money::ZERO);
        assert_eq!(prediction.confidence, Confidence::Low);
    }

    #[test]
    fn test_interest_lengthens_payoff() {
        let loan = loan(Rate::from_percentage(6));
        let payments = monthly(&loan, &[1_000; 6]);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(12_000), &[], at(2024, 1, 1))
            .unwrap()
            .unwrap();

        assert_eq!(prediction.current_rate, Rate::from_percentage(6));
        assert!(prediction.estimated_months_left >= 12);
        assert!(prediction.estimated_months_left <= 13);
        assert!(prediction.total_estimated_interest.is_positive());
        assert_eq!(prediction.confidence, Confidence::Medium);
    }

    #[test]
    fn test_uses_only_recent_window() {
        let loan = loan(Rate::ZERO);
        let mut amounts = vec![100; 4];
        amounts.extend([2_000; 12]);
        let payments = monthly(&loan, &amounts);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(20_000), &[], at(2024, 6, 1))
            .unwrap()
            .unwrap();

        assert_eq!(prediction.average_payment, Money::from_major(2_000));
        assert_eq!(prediction.estimated_months_left, 10);
        assert_eq!(prediction.confidence, Confidence::High);
    }

    #[test]
    fn test_variable_payments_downgrade_confidence() {
        let loan = loan(Rate::ZERO);
        let amounts: Vec<i64> = (0..12).map(|i| if i % 2 == 0 { 500 } else { 2_500 }).collect();
        let payments = monthly(&loan, &amounts);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(15_000), &[], at(2024, 6, 1))
            .unwrap()
            .unwrap();

        // mean 1500, std dev 1000
        assert_eq!(prediction.confidence, Confidence::Medium);
    }

    #[test]
    fn test_floating_rate_at_as_of() {
        let mut loan = loan(Rate::ZERO);
        loan.rates = vec![RateSegment::float(at(2023, 1, 1), Rate::from_percent(dec!(1.0)))];
        let references = vec![
            ReferenceRate::new(at(2023, 1, 1), Rate::from_percent(dec!(3.0))),
            ReferenceRate::new(at(2023, 12, 1), Rate::from_percent(dec!(4.0))),
        ];
        let payments = monthly(&loan, &[3_000, 3_000, 3_000]);

        let prediction = PayoffPredictor::default()
            .predict_at(&loan, &payments, Money::from_major(50_000), &references, at(2024, 1, 1))
            .unwrap()
            .unwrap();

        assert_eq!(prediction.current_rate.as_percent(), dec!(5.0));
    }

    #[test]
    fn test_iteration_cap_bounds_simulation() {
        let loan = loan(Rate::ZERO);
        let payments = monthly(&loan, &[1, 1, 1]);
        let config = PredictionConfig {
            max_iterations: 10,
            ..PredictionConfig::default()
        };

        let prediction = PayoffPredictor::new(config)
            .unwrap()
            .predict_at(&loan, &payments, Money::from_major(1_000_000), &[], at(2024, 1, 1))
            .unwrap()
            .unwrap();

        assert_eq!(prediction.estimated_months_left, 10);
    }

    #[test]
    fn test_predict_with_controlled_time() {
        let loan = loan(Rate::ZERO);
        let payments = monthly(&loan, &[1_000, 1_000, 1_000]);

        let time = SafeTimeProvider::new(TimeSource::Test(at(2024, 1, 1)));
        let control = time.test_control().unwrap();
        control.advance(Duration::days(31));

        let prediction = PayoffPredictor::default()
            .predict(&loan, &payments, Money::from_major(3_000), &[], &time)
            .unwrap()
            .unwrap();

        assert_eq!(prediction.estimated_payoff_date, at(2024, 2, 1) + Duration::days(90));
    }

    #[test]
    fn test_empty_rate_schedule_is_an_error() {
        let mut loan = loan(Rate::ZERO);
        loan.rates.clear();
        let payments = monthly(&loan, &[1_000, 1_000, 1_000]);

        let result = PayoffPredictor::default().predict_at(
            &loan,
            &payments,
            Money::from_major(3_000),
            &[],
            at(2024, 1, 1),
        );
        assert!(matches!(result, Err(LoanError::EmptyRateSchedule)));
    }

    #[test]
    fn test_confidence_downgrade() {
        assert_eq!(Confidence::High.downgrade(), Confidence::Medium);
        assert_eq!(Confidence::Medium.downgrade(), Confidence::Low);
        assert_eq!(Confidence::Low.downgrade(), Confidence::Low);
    }
}
