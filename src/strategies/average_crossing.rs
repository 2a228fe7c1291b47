use crate::error::EngineError;
use crate::models::Order;
use crate::params::{get_param_f64, get_param_i64, get_param_u32};
use crate::series::TimeSeries;
use std::collections::HashMap;

/// All-in/all-out around the historical average: buys one lot when flat and
/// the cost-adjusted price undercuts the average by the buy threshold, sells
/// the whole position once it overshoots by the sell threshold.
pub struct AverageCrossingPolicy {
    template_id: String,
    lot: u32,
    buy_percent: f64,
    sell_percent: f64,
    time_comp: i64,
    amortized_cost: f64,
}

impl AverageCrossingPolicy {
    pub fn new(parameters: &HashMap<String, f64>, transaction_cost: f64) -> Self {
        let lot = get_param_u32(parameters, "lot", 1);
        Self {
            template_id: "average_crossing".to_string(),
            lot,
            buy_percent: get_param_f64(parameters, "buy_percent", 0.03),
            sell_percent: get_param_f64(parameters, "sell_percent", 0.1),
            time_comp: get_param_i64(parameters, "time_comp", -10),
            amortized_cost: transaction_cost / lot.max(1) as f64,
        }
    }
}

impl super::DecisionPolicy for AverageCrossingPolicy {
    fn template_id(&self) -> &str {
        &self.template_id
    }

    fn decide(&self, series: &TimeSeries, held: u32, _tick: u64) -> Result<Order, EngineError> {
        let price = series.current_price()?;
        let average = series.average(self.time_comp, -1)?;

        if held == 0 && price + self.amortized_cost < average * (1.0 + self.buy_percent) {
            return Ok(Order::buy(self.lot));
        }
        if held > 0 && price - self.amortized_cost > average * (1.0 + self.sell_percent) {
            return Ok(Order::sell(held));
        }
        Ok(Order::hold())
    }
}
