use crate::config::Settings;
use crate::error::EngineError;
use crate::market::Market;
use crate::models::{CapitalSample, MoveTable, Order, StrategyStats};
use crate::strategy::DecisionPolicy;
use crate::tradelog::TradeLog;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The accounting state machine shared by every strategy variant. Holds the
/// decision policy as a value; all portfolio/capital mutation lives here, so
/// a policy can only influence a run through the orders it returns.
///
/// A tick is two-phase: every instrument's decision is collected and
/// validated first, then fills are applied. An oversell therefore aborts the
/// tick with the engine state exactly as it was before — no partial
/// application, which keeps candidates comparable inside a search.
pub struct Engine {
    name: String,
    policy: Box<dyn DecisionPolicy>,
    settings: Settings,
    portfolio: BTreeMap<String, u32>,
    capital: f64,
    tick_count: u64,
    transaction_count: u64,
    capital_history: Vec<CapitalSample>,
    moves: MoveTable,
    log: Arc<dyn TradeLog>,
}

impl Engine {
    pub fn new(
        policy: Box<dyn DecisionPolicy>,
        market: &Market,
        start_tick: u64,
        settings: Settings,
        log: Arc<dyn TradeLog>,
    ) -> Self {
        let portfolio: BTreeMap<String, u32> = market
            .instrument_names()
            .into_iter()
            .map(|name| (name.to_string(), 0))
            .collect();
        let capital = settings.start_capital;
        Self {
            name: policy.template_id().to_string(),
            policy,
            settings,
            portfolio,
            capital,
            tick_count: start_tick,
            transaction_count: 0,
            capital_history: vec![CapitalSample {
                tick: start_tick,
                capital,
                total_equity: capital,
            }],
            moves: MoveTable::default(),
            log,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Runs one simulation step: every instrument decides, then the applied
    /// orders mutate portfolio and capital under the accounting invariants.
    pub fn tick(&mut self, market: &Market) -> Result<(), EngineError> {
        let tick = self.tick_count + 1;

        let mut fills: Vec<(String, Order, f64)> = Vec::new();
        for series in market.series() {
            let held = self.portfolio.get(series.name()).copied().unwrap_or(0);
            let order = self.policy.decide(series, held, tick)?;
            if order.is_empty() {
                continue;
            }
            if order.sell > held {
                return Err(EngineError::Oversell {
                    instrument: series.name().to_string(),
                    requested: order.sell,
                    held,
                });
            }
            fills.push((series.name().to_string(), order, series.current_price()?));
        }

        self.tick_count = tick;
        if fills.is_empty() {
            return Ok(());
        }

        for (instrument, order, price) in fills {
            if order.buy > 0 {
                *self.portfolio.entry(instrument.clone()).or_insert(0) += order.buy;
                self.capital -= price * order.buy as f64;
                self.log.record(
                    &self.name,
                    tick,
                    &format!("bought {} {} @ {:.2}", order.buy, instrument, price),
                );
            }
            if order.sell > 0 {
                let held = self
                    .portfolio
                    .get_mut(&instrument)
                    .expect("validated against held shares");
                *held -= order.sell;
                self.capital += price * order.sell as f64;
                self.log.record(
                    &self.name,
                    tick,
                    &format!("sold {} {} @ {:.2}", order.sell, instrument, price),
                );
            }
            // Flat cost per non-zero trade, not per share.
            self.capital -= self.settings.transaction_cost;
            self.capital = self.settings.round(self.capital);
            self.transaction_count += order.shares_traded();
            self.moves.record(&instrument, tick, order);
            self.policy.record_fill(&instrument, &order, price);
        }

        let total_equity = self.total_equity(market)?;
        self.capital_history.push(CapitalSample {
            tick,
            capital: self.capital,
            total_equity,
        });
        Ok(())
    }

    /// Cash plus the mark-to-market value of all held positions.
    pub fn total_equity(&self, market: &Market) -> Result<f64, EngineError> {
        Ok(self.settings.round(self.capital + self.stock_value(market)?))
    }

    fn stock_value(&self, market: &Market) -> Result<f64, EngineError> {
        let mut value = 0.0;
        for (instrument, &held) in &self.portfolio {
            if held == 0 {
                continue;
            }
            let series = market
                .instrument(instrument)
                .ok_or_else(|| EngineError::UnknownInstrument(instrument.clone()))?;
            value += series.current_price()? * held as f64;
        }
        Ok(value)
    }

    /// Pure read of the current run statistics.
    pub fn statistics(&self, market: &Market) -> Result<StrategyStats, EngineError> {
        let stock_value = self.settings.round(self.stock_value(market)?);
        let mut max_capital = f64::NEG_INFINITY;
        let mut min_capital = f64::INFINITY;
        for sample in &self.capital_history {
            max_capital = max_capital.max(sample.capital);
            min_capital = min_capital.min(sample.capital);
        }
        Ok(StrategyStats {
            name: self.name.clone(),
            transaction_count: self.transaction_count,
            capital: self.capital,
            stock_value,
            total_equity: self.total_equity(market)?,
            max_capital,
            min_capital,
            final_portfolio: self.portfolio.clone(),
            moves: self.moves.clone(),
        })
    }

    /// Ends the run: forces one last capital-history sample and consumes the
    /// engine, so a finished run cannot be ticked again.
    pub fn finalize(mut self, market: &Market) -> Result<StrategyStats, EngineError> {
        let total_equity = self.total_equity(market)?;
        self.capital_history.push(CapitalSample {
            tick: self.tick_count,
            capital: self.capital,
            total_equity,
        });
        self.statistics(market)
    }
}
