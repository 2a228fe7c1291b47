use crate::error::EngineError;
use crate::series::TimeSeries;

/// A named collection of price series sharing one global horizon. The
/// harness only ever moves the horizon through `advance_all`/`rewind_all`,
/// so inter-instrument comparisons within a tick stay temporally consistent.
#[derive(Debug, Clone, Default)]
pub struct Market {
    series: Vec<TimeSeries>,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insertion order is preserved; it defines the tick iteration order and
    /// therefore must be deterministic across reloads of the same scenario.
    pub fn add_series(&mut self, series: TimeSeries) -> Result<(), EngineError> {
        if self.series.iter().any(|s| s.name() == series.name()) {
            return Err(EngineError::DuplicateInstrument(series.name().to_string()));
        }
        self.series.push(series);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn series(&self) -> impl Iterator<Item = &TimeSeries> {
        self.series.iter()
    }

    pub fn instrument_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name()).collect()
    }

    /// Absence is a normal case callers must check, not an error.
    pub fn instrument(&self, name: &str) -> Option<&TimeSeries> {
        self.series.iter().find(|s| s.name() == name)
    }

    /// Advances every member series one tick, keeping horizons in lock-step.
    pub fn advance_all(&mut self) -> Result<(), EngineError> {
        for series in &mut self.series {
            series.advance()?;
        }
        Ok(())
    }

    pub fn rewind_all(&mut self, horizon: usize) -> Result<(), EngineError> {
        for series in &mut self.series {
            series.rewind(horizon)?;
        }
        Ok(())
    }

    /// Ticks left before the shortest series is exhausted; zero means the
    /// backtest is over. Halting on the first exhausted instrument is the
    /// documented contract for asymmetric-length scenarios.
    pub fn time_remaining(&self) -> usize {
        self.series
            .iter()
            .map(|s| s.time_remaining())
            .min()
            .unwrap_or(0)
    }
}
