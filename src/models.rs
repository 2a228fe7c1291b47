use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-tick quantities a decision policy wants traded for one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub buy: u32,
    pub sell: u32,
}

impl Order {
    pub fn buy(quantity: u32) -> Self {
        Self {
            buy: quantity,
            sell: 0,
        }
    }

    pub fn sell(quantity: u32) -> Self {
        Self {
            buy: 0,
            sell: quantity,
        }
    }

    pub fn hold() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buy == 0 && self.sell == 0
    }

    pub fn shares_traded(&self) -> u64 {
        self.buy as u64 + self.sell as u64
    }
}

/// Applied trades keyed by instrument and absolute tick index. Recorded by
/// the engine on every fill and consumed by the replay policy, which makes a
/// finished run reproducible move-for-move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveTable(BTreeMap<String, BTreeMap<u64, Order>>);

impl MoveTable {
    pub fn record(&mut self, instrument: &str, tick: u64, order: Order) {
        self.0
            .entry(instrument.to_string())
            .or_default()
            .insert(tick, order);
    }

    pub fn lookup(&self, instrument: &str, tick: u64) -> Option<Order> {
        self.0.get(instrument).and_then(|m| m.get(&tick)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|m| m.is_empty())
    }
}

/// One capital-history sample, appended after every tick that traded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalSample {
    pub tick: u64,
    pub capital: f64,
    pub total_equity: f64,
}

/// Final (or interim) statistics record for one strategy run. Plain data;
/// reporting collaborators treat it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub name: String,
    pub transaction_count: u64,
    pub capital: f64,
    pub stock_value: f64,
    pub total_equity: f64,
    pub max_capital: f64,
    pub min_capital: f64,
    pub final_portfolio: BTreeMap<String, u32>,
    pub moves: MoveTable,
}

/// One discretized search dimension: `samples` evenly spaced points over
/// `[min, max]`, collapsing to `min` when `samples == 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDimension {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Winning candidate of a parameter search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub parameters: HashMap<String, f64>,
    pub score: f64,
}

// Worker communication structures

#[derive(Debug, Clone)]
pub struct ChunkTask {
    pub chunk_index: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub grid_index: usize,
    pub parameters: HashMap<String, f64>,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    pub chunk_index: usize,
    pub best: Option<CandidateScore>,
    pub evaluated: usize,
    pub failed: usize,
}
