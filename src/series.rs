use crate::error::EngineError;

/// An append-only price history for one instrument with a movable horizon
/// cursor. Every read is restricted to indices at or before the horizon;
/// reads past it fail with `LookaheadViolation` rather than returning data
/// the strategy could not have observed yet.
///
/// Offsets passed to the windowed queries are absolute indices when
/// non-negative and horizon-relative when negative: `-1` resolves to the
/// horizon itself, `-5` to four ticks earlier, so the window `(-5, -1)`
/// covers the last five observations.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    name: String,
    observations: Vec<f64>,
    horizon: usize,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, observations: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            observations,
            horizon: 0,
        }
    }

    pub fn with_horizon(
        name: impl Into<String>,
        observations: Vec<f64>,
        horizon: usize,
    ) -> Result<Self, EngineError> {
        let mut series = Self::new(name, observations);
        series.rewind(horizon)?;
        Ok(series)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Full stored history length, including observations past the horizon.
    pub fn history_len(&self) -> usize {
        self.observations.len()
    }

    /// Ticks left before the series runs out of future observations.
    pub fn time_remaining(&self) -> usize {
        self.observations.len().saturating_sub(self.horizon + 1)
    }

    /// Streaming-mode append of a genuinely observed price. The horizon does
    /// not move; `advance` consumes the new observation later.
    pub fn push(&mut self, price: f64) {
        self.observations.push(price);
    }

    /// Moves the horizon forward one tick.
    pub fn advance(&mut self) -> Result<(), EngineError> {
        if self.horizon + 1 >= self.observations.len() {
            return Err(EngineError::EndOfHistory {
                instrument: self.name.clone(),
            });
        }
        self.horizon += 1;
        Ok(())
    }

    /// Window-mode reset used by the harness before a run.
    pub fn rewind(&mut self, horizon: usize) -> Result<(), EngineError> {
        if horizon >= self.observations.len() {
            return Err(EngineError::OutOfRange {
                instrument: self.name.clone(),
                horizon,
                len: self.observations.len(),
            });
        }
        self.horizon = horizon;
        Ok(())
    }

    pub fn current_price(&self) -> Result<f64, EngineError> {
        self.observations
            .get(self.horizon)
            .copied()
            .ok_or(EngineError::OutOfRange {
                instrument: self.name.clone(),
                horizon: self.horizon,
                len: self.observations.len(),
            })
    }

    pub fn average(&self, from_offset: i64, to_offset: i64) -> Result<f64, EngineError> {
        let window = self.window(from_offset, to_offset)?;
        Ok(window.iter().sum::<f64>() / window.len() as f64)
    }

    pub fn min(&self, from_offset: i64, to_offset: i64) -> Result<f64, EngineError> {
        let window = self.window(from_offset, to_offset)?;
        Ok(window.iter().copied().fold(f64::INFINITY, f64::min))
    }

    pub fn max(&self, from_offset: i64, to_offset: i64) -> Result<f64, EngineError> {
        let window = self.window(from_offset, to_offset)?;
        Ok(window.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Average per-step rate of change between the two resolved indices.
    /// Coincident indices and empty series yield `0.0` instead of an error; a
    /// flat or degenerate window is a normal occurrence mid-backtest.
    pub fn trend(&self, from_offset: i64, to_offset: i64) -> Result<f64, EngineError> {
        if self.observations.is_empty() {
            return Ok(0.0);
        }
        let from = self.resolve(from_offset)?;
        let to = self.resolve(to_offset)?;
        if from == to {
            return Ok(0.0);
        }
        Ok((self.observations[from] - self.observations[to]) / (from as f64 - to as f64))
    }

    fn resolve(&self, offset: i64) -> Result<usize, EngineError> {
        let resolved = if offset < 0 {
            self.horizon as i64 + 1 + offset
        } else {
            offset
        };
        if resolved < 0 || resolved > self.horizon as i64 {
            return Err(EngineError::LookaheadViolation {
                instrument: self.name.clone(),
                index: resolved,
                horizon: self.horizon,
            });
        }
        Ok(resolved as usize)
    }

    fn window(&self, from_offset: i64, to_offset: i64) -> Result<&[f64], EngineError> {
        if self.observations.is_empty() {
            return Err(EngineError::EmptyWindow {
                instrument: self.name.clone(),
                from: from_offset,
                to: to_offset,
            });
        }
        let from = self.resolve(from_offset)?;
        let to = self.resolve(to_offset)?;
        if from > to {
            return Err(EngineError::EmptyWindow {
                instrument: self.name.clone(),
                from: from_offset,
                to: to_offset,
            });
        }
        Ok(&self.observations[from..=to])
    }
}
