use crate::config::Settings;
use crate::harness::BacktestHarness;
use crate::models::ParameterDimension;
use crate::params::ParameterSpace;
use crate::scenario;
use crate::search::{search, ScoreFn, SearchConfig};
use crate::strategy::{create_policy, DecisionPolicy, ReplayPolicy};
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn run(
    scenario_dir: &Path,
    template_id: &str,
    bounds: &str,
    score: &str,
    workers: Option<usize>,
    start: Option<usize>,
    instruments: Option<&[String]>,
    settings: Settings,
    replay_raw: bool,
) -> Result<()> {
    settings.validate()?;
    let space = ParameterSpace::new(parse_bounds(bounds)?)?;
    let score_fn = ScoreFn::parse(score)?;
    let start_horizon = start.unwrap_or(settings.default_start_horizon);

    let config = SearchConfig {
        template_id: template_id.to_string(),
        start_horizon,
        parallelism: workers.unwrap_or_else(num_cpus::get),
        score_fn,
        settings: settings.clone(),
    };
    if replay_raw {
        info!("Searching against delta-normalized prices; winner replays against raw prices");
    }

    let loader = || {
        if replay_raw {
            scenario::load_scenario_normalized(scenario_dir, instruments)
        } else {
            scenario::load_scenario(scenario_dir, instruments)
        }
    };
    let best = search(&space, loader, &config)?;

    let Some(best) = best else {
        warn!("Search produced no result; every candidate failed");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&best)?);

    if replay_raw {
        let harness = BacktestHarness::new(settings.clone());
        let mut normalized = scenario::load_scenario_normalized(scenario_dir, instruments)?;
        let normalized_stats = harness.run(&mut normalized, start_horizon, || {
            create_policy(template_id, &best.parameters, settings.transaction_cost)
        })?;

        let mut raw = scenario::load_scenario(scenario_dir, instruments)?;
        let moves = normalized_stats.moves.clone();
        let raw_stats = harness.run(&mut raw, start_horizon, move || {
            Ok(Box::new(ReplayPolicy::new(moves)) as Box<dyn DecisionPolicy>)
        })?;
        info!(
            "Winning moves replayed on raw prices: total equity {:.2}",
            raw_stats.total_equity
        );
        println!("{}", serde_json::to_string_pretty(&raw_stats)?);
    }
    Ok(())
}

/// Bounds are either inline JSON (an array of dimensions) or a path to a
/// JSON file holding the same.
fn parse_bounds(bounds: &str) -> Result<Vec<ParameterDimension>> {
    let json = if bounds.trim_start().starts_with('[') {
        bounds.to_string()
    } else {
        fs::read_to_string(bounds)
            .with_context(|| format!("failed to read bounds file {bounds}"))?
    };
    serde_json::from_str(&json).context("invalid bounds JSON")
}
