use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

/// payoff prediction tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// fewer payments than this yields no prediction
    pub min_payments: usize,
    /// how many of the most recent payments describe the trend
    pub recent_window: usize,
    /// recent payments needed for high confidence
    pub high_confidence_payments: usize,
    /// recent payments needed for medium confidence
    pub medium_confidence_payments: usize,
    /// coefficient of variation above which confidence drops one level
    pub variation_threshold: Decimal,
    /// gap assumed when there are fewer than two payment dates
    pub default_gap_days: Decimal,
    /// days per simulated month
    pub days_per_month: Decimal,
    /// balance at or below this counts as paid off
    pub payoff_threshold: Money,
    /// simulation step cap (600 monthly steps is 50 years)
    pub max_iterations: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_payments: 3,
            recent_window: 12,
            high_confidence_payments: 12,
            medium_confidence_payments: 6,
            variation_threshold: dec!(0.3),
            default_gap_days: dec!(30),
            days_per_month: dec!(30),
            payoff_threshold: Money::CENT,
            max_iterations: 600,
        }
    }
}

impl PredictionConfig {
    /// parse from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_payments == 0 {
            return Err(invalid("min_payments must be at least 1"));
        }
        if self.recent_window < self.min_payments {
            return Err(invalid("recent_window must cover min_payments"));
        }
        if self.medium_confidence_payments > self.high_confidence_payments {
            return Err(invalid("medium confidence threshold exceeds high confidence threshold"));
        }
        if self.variation_threshold < Decimal::ZERO {
            return Err(invalid("variation_threshold must not be negative"));
        }
        if self.default_gap_days <= Decimal::ZERO || self.days_per_month <= Decimal::ZERO {
            return Err(invalid("day counts must be positive"));
        }
        if self.payoff_threshold.is_negative() {
            return Err(invalid("payoff_threshold must not be negative"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> LoanError {
    LoanError::InvalidConfiguration {
        message: message.to_string(),
    }
}
