use anyhow::{anyhow, Result};

/// Run-level accounting configuration, threaded by value into every engine.
/// The flat transaction cost is an explicit setting here rather than any
/// process-wide lookup, so parallel search workers stay isolated.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cash balance a strategy starts with.
    pub start_capital: f64,
    /// Flat cost charged once per instrument-tick with a non-zero trade,
    /// not per share.
    pub transaction_cost: f64,
    /// Decimal places capital and equity are rounded to after trading ticks.
    pub rounding_decimals: u32,
    /// Horizon a run starts from when the caller does not override it;
    /// leaves the strategies their lookback windows.
    pub default_start_horizon: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_capital: 10_000.0,
            transaction_cost: 0.0,
            rounding_decimals: 2,
            default_start_horizon: 20,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !self.start_capital.is_finite() {
            return Err(anyhow!("start capital must be finite"));
        }
        if !self.transaction_cost.is_finite() || self.transaction_cost < 0.0 {
            return Err(anyhow!(
                "transaction cost must be finite and non-negative (value: {})",
                self.transaction_cost
            ));
        }
        Ok(())
    }

    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.rounding_decimals as i32);
        (value * factor).round() / factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_configured_precision() {
        let settings = Settings::default();
        assert_eq!(settings.round(10.005), 10.01);
        assert_eq!(settings.round(-3.14159), -3.14);
    }

    #[test]
    fn rejects_negative_transaction_cost() {
        let settings = Settings {
            transaction_cost: -1.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
