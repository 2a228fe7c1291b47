use crate::error::EngineError;
use crate::models::Order;
use crate::params::{get_param_f64, get_param_i64, get_param_u32};
use crate::series::TimeSeries;
use std::collections::HashMap;

/// Keeps adding a lot whenever the cost-adjusted price undercuts the
/// historical average (no flat-check, unlike the crossing variant) and sells
/// the accumulated position once the price clears the running average buy
/// price by the sell threshold, clearing the cost basis afterwards.
pub struct CostAveragingPolicy {
    template_id: String,
    lot: u32,
    buy_percent: f64,
    sell_percent: f64,
    time_comp: i64,
    amortized_cost: f64,
    buy_prices: HashMap<String, Vec<f64>>,
}

impl CostAveragingPolicy {
    pub fn new(parameters: &HashMap<String, f64>, transaction_cost: f64) -> Self {
        let lot = get_param_u32(parameters, "lot", 1);
        Self {
            template_id: "cost_averaging".to_string(),
            lot,
            buy_percent: get_param_f64(parameters, "buy_percent", 0.03),
            sell_percent: get_param_f64(parameters, "sell_percent", 0.1),
            time_comp: get_param_i64(parameters, "time_comp", -10),
            amortized_cost: transaction_cost / lot.max(1) as f64,
            buy_prices: HashMap::new(),
        }
    }

    fn average_buy_price(&self, instrument: &str) -> Option<f64> {
        let prices = self.buy_prices.get(instrument)?;
        if prices.is_empty() {
            return None;
        }
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    }
}

impl super::DecisionPolicy for CostAveragingPolicy {
    fn template_id(&self) -> &str {
        &self.template_id
    }

    fn decide(&self, series: &TimeSeries, held: u32, _tick: u64) -> Result<Order, EngineError> {
        let price = series.current_price()?;

        if held > 0 {
            if let Some(average_buy) = self.average_buy_price(series.name()) {
                if price - self.amortized_cost > average_buy * (1.0 + self.sell_percent) {
                    return Ok(Order::sell(held));
                }
            }
        }

        let average = series.average(self.time_comp, -1)?;
        if price + self.amortized_cost < average * (1.0 + self.buy_percent) {
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
