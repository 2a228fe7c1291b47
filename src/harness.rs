use crate::config::Settings;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::market::Market;
use crate::models::StrategyStats;
use crate::strategy::DecisionPolicy;
use crate::tradelog::{NullLog, TradeLog};
use std::sync::Arc;

/// Canonical simulation driver: rewinds the market to the start horizon,
/// then ticks strategies and advances the market in lock-step until history
/// is exhausted. The loop is strictly sequential; only the parameter search
/// runs harnesses in parallel, one per worker.
pub struct BacktestHarness {
    settings: Settings,
    log: Arc<dyn TradeLog>,
}

impl BacktestHarness {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            log: Arc::new(NullLog),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn TradeLog>) -> Self {
        self.log = log;
        self
    }

    /// Runs one strategy over the market's remaining history and returns its
    /// final statistics. A start horizon that leaves a policy less history
    /// than its lookback window surfaces as `LookaheadViolation` out of the
    /// first tick; that is a misconfigured backtest, not a condition to
    /// recover from, so it propagates.
    pub fn run<F>(
        &self,
        market: &mut Market,
        start_horizon: usize,
        factory: F,
    ) -> Result<StrategyStats, EngineError>
    where
        F: FnOnce() -> Result<Box<dyn DecisionPolicy>, EngineError>,
    {
        let mut stats = self.run_many(market, start_horizon, vec![factory()?])?;
        Ok(stats.pop().expect("one engine per policy"))
    }

    /// Side-by-side variant: every strategy ticks once per market advance,
    /// all of them seeing identical horizons.
    pub fn run_many(
        &self,
        market: &mut Market,
        start_horizon: usize,
        policies: Vec<Box<dyn DecisionPolicy>>,
    ) -> Result<Vec<StrategyStats>, EngineError> {
        if market.is_empty() {
            return Err(EngineError::EmptyScenario);
        }
        market.rewind_all(start_horizon)?;

        let mut engines: Vec<Engine> = policies
            .into_iter()
            .map(|policy| {
                Engine::new(
                    policy,
                    market,
                    start_horizon as u64,
                    self.settings.clone(),
                    self.log.clone(),
                )
            })
            .collect();

        while market.time_remaining() > 0 {
            for engine in &mut engines {
                engine.tick(market)?;
            }
            market.advance_all()?;
        }

        engines
            .into_iter()
            .map(|engine| engine.finalize(market))
            .collect()
    }
}
