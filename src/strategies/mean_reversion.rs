use crate::error::EngineError;
use crate::models::Order;
use crate::params::{get_param_f64, get_param_u32};
use crate::series::TimeSeries;
use std::collections::HashMap;

const MIN_LOOKBACK: i64 = -5;
const TREND_LOOKBACK: i64 = -3;

/// Buys a fixed lot when price sits in a tolerance band around the recent
/// minimum while the short trend stays strictly inside the configured band;
/// sells the whole position once price clears the average buy price by the
/// profit percentage.
pub struct MeanReversionPolicy {
    template_id: String,
    profit_percent: f64,
    band_percent: f64,
    min_trend: f64,
    max_trend: f64,
    lot: u32,
    buy_prices: HashMap<String, Vec<f64>>,
}

impl MeanReversionPolicy {
    pub fn new(parameters: &HashMap<String, f64>) -> Self {
        Self {
            template_id: "mean_reversion".to_string(),
            profit_percent: get_param_f64(parameters, "profit_percent", 0.02),
            band_percent: get_param_f64(parameters, "band_percent", 0.01),
            min_trend: get_param_f64(parameters, "min_trend", -0.01),
            max_trend: get_param_f64(parameters, "max_trend", 0.05),
            lot: get_param_u32(parameters, "lot", 1),
            buy_prices: HashMap::new(),
        }
    }

    /// Equal lots per fill, so the volume-weighted average buy price is the
    /// plain mean of the recorded fill prices.
    fn average_buy_price(&self, instrument: &str) -> Option<f64> {
        let prices = self.buy_prices.get(instrument)?;
        if prices.is_empty() {
            return None;
        }
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    }
}

// The lower bound mirrors the reference across zero.
fn within_band(reference: f64, value: f64, percent: f64) -> bool {
    reference * (-(1.0 + percent)) <= value && value <= reference * (1.0 + percent)
}

impl super::DecisionPolicy for MeanReversionPolicy {
    fn template_id(&self) -> &str {
        &self.template_id
    }

    fn decide(&self, series: &TimeSeries, held: u32, _tick: u64) -> Result<Order, EngineError> {
        let price = series.current_price()?;

        if held > 0 {
            if let Some(average_buy) = self.average_buy_price(series.name()) {
                if price >= average_buy * (1.0 + self.profit_percent) {
                    return Ok(Order::sell(held));
                }
            }
        }

        let recent_min = series.min(MIN_LOOKBACK, -1)?;
        let trend = series.trend(TREND_LOOKBACK, -1)?;
        if within_band(recent_min, price, self.band_percent)
            && self.min_trend < trend
            && trend < self.max_trend
        {
            return Ok(Order::buy(self.lot));
        }

        Ok(Order::hold())
    }

    fn record_fill(&mut self, instrument: &str, order: &Order, price: f64) {
        if order.buy > 0 {
            self.buy_prices
                .entry(instrument.to_string())
                .or_default()
                .push(price);
        }
        if order.sell > 0 {
            self.buy_prices.remove(instrument);
        }
    }
}
