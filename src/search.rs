use crate::config::Settings;
use crate::harness::BacktestHarness;
use crate::market::Market;
use crate::models::{CandidateScore, ChunkOutcome, ChunkTask, SearchResult, StrategyStats};
use crate::params::ParameterSpace;
use crate::strategy::create_policy;
use anyhow::{anyhow, Result};
use crossbeam_channel::bounded;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::thread;

/// Scalar objective derived from a run's final statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFn {
    TotalEquity,
    /// Total equity normalized by liquid-capital exposure. Preserved as a
    /// selectable alternative, not the default.
    EquityOverExposure,
}

impl ScoreFn {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "total-equity" | "total_equity" => Ok(Self::TotalEquity),
            "equity-over-exposure" | "equity_over_exposure" => Ok(Self::EquityOverExposure),
            other => Err(anyhow!(
                "score must be total-equity or equity-over-exposure (value: {})",
                other
            )),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TotalEquity => "total equity",
            Self::EquityOverExposure => "equity over exposure",
        }
    }

    pub fn score(self, stats: &StrategyStats) -> f64 {
        let raw = match self {
            Self::TotalEquity => stats.total_equity,
            Self::EquityOverExposure => stats.total_equity / (stats.capital.abs() + 1.0),
        };
        if raw.is_finite() {
            raw
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub template_id: String,
    pub start_horizon: usize,
    pub parallelism: usize,
    pub score_fn: ScoreFn,
    pub settings: Settings,
}

/// Exhaustively evaluates the parameter grid and returns the best-scoring
/// candidate, or `None` if every candidate failed.
///
/// The grid is split into `parallelism` contiguous chunks, one worker thread
/// per chunk. Each worker loads its own Market through `loader` (stateless
/// per call — nothing is shared by reference across the worker boundary) and
/// keeps only its local best. The reduction walks worker results in chunk
/// order with a strict greater-than, so ties keep the first-seen candidate
/// in grid enumeration order and the outcome is identical for any worker
/// count.
pub fn search<L>(
    space: &ParameterSpace,
    loader: L,
    config: &SearchConfig,
) -> Result<Option<SearchResult>>
where
    L: Fn() -> Result<Market> + Send + Sync,
{
    let chunks = space.chunks(config.parallelism);
    if chunks.is_empty() {
        return Err(anyhow!("parameter space produced no candidates"));
    }

    let total = space.len();
    info!(
        "Evaluating {} candidates across {} workers (objective: {})",
        total,
        chunks.len(),
        config.score_fn.label()
    );

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("static progress template")
            .progress_chars("#>-"),
    );

    let (result_tx, result_rx) = bounded::<ChunkOutcome>(chunks.len());
    thread::scope(|scope| {
        for task in &chunks {
            let result_tx = result_tx.clone();
            let progress = progress.clone();
            let loader = &loader;
            scope.spawn(move || {
                let outcome = run_chunk(space, loader, config, task, &progress);
                // The channel is bounded at chunk count; a send never blocks.
                let _ = result_tx.send(outcome);
            });
        }
    });
    drop(result_tx);
    progress.finish_and_clear();

    let mut outcomes: Vec<ChunkOutcome> = result_rx.try_iter().collect();
    outcomes.sort_by_key(|outcome| outcome.chunk_index);

    let evaluated: usize = outcomes.iter().map(|o| o.evaluated).sum();
    let failed: usize = outcomes.iter().map(|o| o.failed).sum();
    if failed > 0 {
        warn!("{} of {} candidates failed and were skipped", failed, total);
    }

    let mut best: Option<CandidateScore> = None;
    for outcome in outcomes {
        let Some(candidate) = outcome.best else {
            continue;
        };
        let better = best
            .as_ref()
            .map(|current| candidate.score > current.score)
            .unwrap_or(true);
        if better {
            best = Some(candidate);
        }
    }

    match best {
        Some(candidate) => {
            info!(
                "Best of {} evaluated candidates: score {:.4} at grid index {}",
                evaluated, candidate.score, candidate.grid_index
            );
            Ok(Some(SearchResult {
                parameters: candidate.parameters,
                score: candidate.score,
            }))
        }
        None => {
            warn!("No candidate produced a score; search has no result");
            Ok(None)
        }
    }
}

fn run_chunk<L>(
    space: &ParameterSpace,
    loader: &L,
    config: &SearchConfig,
    task: &ChunkTask,
    progress: &ProgressBar,
) -> ChunkOutcome
where
    L: Fn() -> Result<Market> + Send + Sync,
{
    let chunk_len = task.end - task.start;
    let mut market = match loader() {
        Ok(market) => market,
        Err(error) => {
            warn!(
                "Worker {} failed to load its scenario: {}",
                task.chunk_index, error
            );
            progress.inc(chunk_len as u64);
            return ChunkOutcome {
                chunk_index: task.chunk_index,
                best: None,
                evaluated: 0,
                failed: chunk_len,
            };
        }
    };

    let mut best: Option<CandidateScore> = None;
    let mut evaluated = 0usize;
    let mut failed = 0usize;

    for grid_index in task.start..task.end {
        let parameters = space.candidate(grid_index);
        let harness = BacktestHarness::new(config.settings.clone());
        let run = harness.run(&mut market, config.start_horizon, || {
            create_policy(
                &config.template_id,
                &parameters,
                config.settings.transaction_cost,
            )
        });
        progress.inc(1);

        match run {
            Ok(stats) => {
                evaluated += 1;
                let score = config.score_fn.score(&stats);
                let better = best
                    .as_ref()
                    .map(|current| score > current.score)
                    .unwrap_or(true);
                if better {
                    best = Some(CandidateScore {
                        grid_index,
                        parameters,
                        score,
                    });
                }
            }
            Err(error) => {
                // One malformed candidate must not abort the grid search.
                failed += 1;
                warn!("Candidate {} failed: {}", grid_index, error);
            }
        }
    }

    ChunkOutcome {
        chunk_index: task.chunk_index,
        best,
        evaluated,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParameterDimension;
    use crate::series::TimeSeries;

    fn dim(name: &str, min: f64, max: f64, samples: usize) -> ParameterDimension {
        ParameterDimension {
            name: name.to_string(),
            min,
            max,
            samples,
        }
    }

    fn load_market() -> Result<Market> {
        let mut market = Market::new();
        market.add_series(TimeSeries::new(
            "acme",
            vec![
                10.0, 10.5, 9.8, 10.2, 9.9, 10.1, 9.5, 9.0, 9.4, 10.8, 11.2, 10.9, 11.5, 12.0,
                11.8, 12.4,
            ],
        ))?;
        Ok(market)
    }

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            dim("lot", 1.0, 1.0, 1),
            dim("buy_percent", -0.1, 0.1, 3),
            dim("sell_percent", -0.1, 0.1, 3),
            dim("time_comp", -4.0, -4.0, 1),
        ])
        .unwrap()
    }

    fn config(parallelism: usize) -> SearchConfig {
        SearchConfig {
            template_id: "average_crossing".to_string(),
            start_horizon: 5,
            parallelism,
            score_fn: ScoreFn::TotalEquity,
            settings: Settings {
                start_capital: 0.0,
                ..Settings::default()
            },
        }
    }

    #[test]
    fn worker_count_does_not_change_the_winner() {
        let space = space();
        let single = search(&space, load_market, &config(1)).unwrap().unwrap();
        let triple = search(&space, load_market, &config(3)).unwrap().unwrap();
        let many = search(&space, load_market, &config(9)).unwrap().unwrap();

        assert_eq!(single.score, triple.score);
        assert_eq!(single.parameters, triple.parameters);
        assert_eq!(single.score, many.score);
        assert_eq!(single.parameters, many.parameters);
    }

    #[test]
    fn ties_keep_the_first_candidate_in_grid_order() {
        // A buy threshold far below any price means no candidate ever
        // trades, so every score equals the start capital.
        let space = ParameterSpace::new(vec![
            dim("lot", 1.0, 1.0, 1),
            dim("buy_percent", -0.9, -0.8, 4),
            dim("sell_percent", 0.5, 0.9, 3),
            dim("time_comp", -4.0, -4.0, 1),
        ])
        .unwrap();

        for parallelism in [1, 2, 5] {
            let best = search(&space, load_market, &config(parallelism))
                .unwrap()
                .unwrap();
            assert_eq!(best.parameters, space.candidate(0));
        }
    }

    #[test]
    fn unknown_template_fails_every_candidate_and_yields_none() {
        let mut config = config(2);
        config.template_id = "does_not_exist".to_string();
        let best = search(&space(), load_market, &config).unwrap();
        assert!(best.is_none());
    }

    #[test]
    fn equity_over_exposure_divides_by_liquid_capital() {
        let stats = StrategyStats {
            name: "x".to_string(),
            transaction_count: 2,
            capital: -4.0,
            stock_value: 14.0,
            total_equity: 10.0,
            max_capital: 0.0,
            min_capital: -4.0,
            final_portfolio: Default::default(),
            moves: Default::default(),
        };
        assert_eq!(ScoreFn::TotalEquity.score(&stats), 10.0);
        assert_eq!(ScoreFn::EquityOverExposure.score(&stats), 2.0);
    }
}
