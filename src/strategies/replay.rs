use crate::error::EngineError;
use crate::models::{MoveTable, Order};
use crate::series::TimeSeries;

/// Replays a precomputed move table tick-for-tick. Running this over the
/// scenario that produced the table must reproduce the original statistics
/// exactly, which makes it the correctness oracle for the engine itself.
pub struct ReplayPolicy {
    template_id: String,
    moves: MoveTable,
}

impl ReplayPolicy {
    pub fn new(moves: MoveTable) -> Self {
        Self {
            template_id: "replay".to_string(),
            moves,
        }
    }
}

impl super::DecisionPolicy for ReplayPolicy {
    fn template_id(&self) -> &str {
        &self.template_id
    }

    fn decide(&self, series: &TimeSeries, _held: u32, tick: u64) -> Result<Order, EngineError> {
        Ok(self
            .moves
            .lookup(series.name(), tick)
            .unwrap_or_else(Order::hold))
    }
}
