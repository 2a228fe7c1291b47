use crate::config::Settings;
use crate::harness::BacktestHarness;
use crate::scenario;
use crate::strategy::create_policy;
use crate::tradelog::FileLog;
use anyhow::{Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[allow(clippy::too_many_arguments)]
pub fn run(
    scenario_dir: &Path,
    template_id: &str,
    params_json: Option<&str>,
    instruments: Option<&[String]>,
    start: Option<usize>,
    settings: Settings,
    log_dir: Option<&Path>,
) -> Result<()> {
    settings.validate()?;
    let parameters: HashMap<String, f64> = match params_json {
        Some(json) => serde_json::from_str(json).context("invalid parameter JSON")?,
        None => HashMap::new(),
    };

    let mut market = scenario::load_scenario(scenario_dir, instruments)?;
    let start_horizon = start.unwrap_or(settings.default_start_horizon);
    info!(
        "Backtesting {} over {} instrument(s) from horizon {}",
        template_id,
        market.len(),
        start_horizon
    );

    let mut harness = BacktestHarness::new(settings.clone());
    if let Some(dir) = log_dir {
        harness = harness.with_log(Arc::new(FileLog::new(dir)));
    }
    let stats = harness.run(&mut market, start_horizon, || {
        create_policy(template_id, &parameters, settings.transaction_cost)
    })?;

    info!(
        "Run complete: {} transactions, total equity {:.2}",
        stats.transaction_count, stats.total_equity
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
