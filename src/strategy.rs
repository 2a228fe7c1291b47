use crate::error::EngineError;
use crate::models::Order;
use crate::series::TimeSeries;
use std::collections::HashMap;

/// The sole polymorphic point of a strategy. `decide` is a pure function of
/// the policy's parameters and the windowed statistics of one instrument;
/// it must never read past the series horizon (the series enforces this).
/// State that depends on executed trades (cost basis, position averages) is
/// updated through `record_fill`, which the engine calls only for orders it
/// actually applied.
pub trait DecisionPolicy: Send {
    fn template_id(&self) -> &str;

    fn decide(&self, series: &TimeSeries, held: u32, tick: u64) -> Result<Order, EngineError>;

    fn record_fill(&mut self, _instrument: &str, _order: &Order, _price: f64) {}
}

#[path = "strategies/mean_reversion.rs"]
pub mod mean_reversion;

pub use mean_reversion::MeanReversionPolicy;

#[path = "strategies/average_crossing.rs"]
pub mod average_crossing;

pub use average_crossing::AverageCrossingPolicy;

#[path = "strategies/cost_averaging.rs"]
pub mod cost_averaging;

pub use cost_averaging::CostAveragingPolicy;

#[path = "strategies/replay.rs"]
pub mod replay;

pub use replay::ReplayPolicy;

pub fn create_policy(
    template_id: &str,
    parameters: &HashMap<String, f64>,
    transaction_cost: f64,
) -> Result<Box<dyn DecisionPolicy>, EngineError> {
    match template_id {
        "mean_reversion" => Ok(Box::new(MeanReversionPolicy::new(parameters))),
        "average_crossing" => Ok(Box::new(AverageCrossingPolicy::new(
            parameters,
            transaction_cost,
        ))),
        "cost_averaging" => Ok(Box::new(CostAveragingPolicy::new(
            parameters,
            transaction_cost,
        ))),
        _ => Err(EngineError::UnknownTemplate(template_id.to_string())),
    }
}
