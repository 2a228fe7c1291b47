use crate::config::Settings;
use crate::harness::BacktestHarness;
use crate::models::MoveTable;
use crate::scenario;
use crate::strategy::{DecisionPolicy, ReplayPolicy};
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

pub fn run(
    scenario_dir: &Path,
    moves_file: &Path,
    instruments: Option<&[String]>,
    start: Option<usize>,
    settings: Settings,
) -> Result<()> {
    settings.validate()?;
    let json = fs::read_to_string(moves_file)
        .with_context(|| format!("failed to read move table {}", moves_file.display()))?;
    let moves: MoveTable = serde_json::from_str(&json).context("invalid move table JSON")?;

    let mut market = scenario::load_scenario(scenario_dir, instruments)?;
    let start_horizon = start.unwrap_or(settings.default_start_horizon);
    info!(
        "Replaying recorded moves over {} instrument(s) from horizon {}",
        market.len(),
        start_horizon
    );

    let harness = BacktestHarness::new(settings);
    let stats = harness.run(&mut market, start_horizon, move || {
        Ok(Box::new(ReplayPolicy::new(moves)) as Box<dyn DecisionPolicy>)
    })?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
