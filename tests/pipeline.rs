use algolab::config::Settings;
use algolab::error::EngineError;
use algolab::harness::BacktestHarness;
use algolab::market::Market;
use algolab::models::ParameterDimension;
use algolab::params::ParameterSpace;
use algolab::scenario::{load_scenario, load_scenario_normalized, write_scenario};
use algolab::search::{search, ScoreFn, SearchConfig};
use algolab::strategy::{create_policy, DecisionPolicy, ReplayPolicy};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

const START_HORIZON: usize = 5;

/// A deliberately swingy series: repeated dips below and spikes above its
/// running average so the threshold strategies actually trade.
fn acme_prices() -> Vec<f64> {
    vec![
        10.0, 11.0, 9.0, 12.0, 8.0, 13.0, 7.0, 14.0, 10.0, 15.0, 9.0, 16.0, 8.0, 17.0, 11.0, 18.0,
        9.5, 19.0, 12.0, 20.0,
    ]
}

fn beta_prices() -> Vec<f64> {
    vec![
        50.0, 49.0, 51.0, 48.0, 52.0, 47.0, 53.0, 46.0, 54.0, 45.0, 55.0, 44.0, 56.0, 43.0, 57.0,
        42.0, 58.0, 41.0, 59.0, 40.0,
    ]
}

fn write_test_scenario(dir: &Path) -> Result<()> {
    write_scenario(
        dir,
        &[
            ("acme".to_string(), acme_prices()),
            ("beta".to_string(), beta_prices()),
        ],
    )
}

fn settings(capital: f64, cost: f64) -> Settings {
    Settings {
        start_capital: capital,
        transaction_cost: cost,
        ..Settings::default()
    }
}

fn cost_averaging_params() -> HashMap<String, f64> {
    HashMap::from([
        ("lot".to_string(), 2.0),
        ("buy_percent".to_string(), -0.05),
        ("sell_percent".to_string(), 0.05),
        ("time_comp".to_string(), -4.0),
    ])
}

#[test]
fn scripted_replay_reproduces_the_original_run() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let run_settings = settings(0.0, 0.25);
    let harness = BacktestHarness::new(run_settings.clone());

    let mut market = load_scenario(dir.path(), None)?;
    let original = harness.run(&mut market, START_HORIZON, || {
        create_policy(
            "cost_averaging",
            &cost_averaging_params(),
            run_settings.transaction_cost,
        )
    })?;
    assert!(
        original.transaction_count > 0,
        "scenario must produce trades for the oracle to mean anything"
    );

    let mut fresh = load_scenario(dir.path(), None)?;
    let moves = original.moves.clone();
    let reproduced = harness.run(&mut fresh, START_HORIZON, move || {
        Ok(Box::new(ReplayPolicy::new(moves)) as Box<dyn DecisionPolicy>)
    })?;

    assert_eq!(reproduced.final_portfolio, original.final_portfolio);
    assert_eq!(reproduced.total_equity, original.total_equity);
    assert_eq!(reproduced.capital, original.capital);
    assert_eq!(reproduced.transaction_count, original.transaction_count);
    assert_eq!(reproduced.moves, original.moves);
    Ok(())
}

#[test]
fn identical_runs_yield_byte_identical_statistics() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let run = || -> Result<String> {
        let harness = BacktestHarness::new(settings(0.0, 0.25));
        let mut market = load_scenario(dir.path(), None)?;
        let stats = harness.run(&mut market, START_HORIZON, || {
            create_policy("cost_averaging", &cost_averaging_params(), 0.25)
        })?;
        Ok(serde_json::to_string(&stats)?)
    };

    assert_eq!(run()?, run()?);
    Ok(())
}

#[test]
fn equity_decomposes_into_capital_plus_stock_value() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let harness = BacktestHarness::new(settings(1_000.0, 0.25));
    let mut market = load_scenario(dir.path(), None)?;
    let stats = harness.run(&mut market, START_HORIZON, || {
        create_policy("cost_averaging", &cost_averaging_params(), 0.25)
    })?;

    assert!((stats.total_equity - (stats.capital + stats.stock_value)).abs() < 0.011);
    assert!(stats.min_capital <= stats.capital);
    assert!(stats.max_capital >= 1_000.0);
    Ok(())
}

#[test]
fn nine_candidate_grid_is_stable_across_worker_counts() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let space = ParameterSpace::new(vec![
        ParameterDimension {
            name: "lot".to_string(),
            min: 1.0,
            max: 1.0,
            samples: 1,
        },
        ParameterDimension {
            name: "buy_percent".to_string(),
            min: -0.1,
            max: 0.1,
            samples: 3,
        },
        ParameterDimension {
            name: "sell_percent".to_string(),
            min: -0.1,
            max: 0.1,
            samples: 3,
        },
        ParameterDimension {
            name: "time_comp".to_string(),
            min: -10.0,
            max: -10.0,
            samples: 1,
        },
    ])?;
    assert_eq!(space.len(), 9);

    let loader = || load_scenario(dir.path(), None);
    let config = |workers: usize| SearchConfig {
        template_id: "average_crossing".to_string(),
        start_horizon: 10,
        parallelism: workers,
        score_fn: ScoreFn::TotalEquity,
        settings: settings(0.0, 0.0),
    };

    let single = search(&space, loader, &config(1))?.expect("grid has valid candidates");
    let triple = search(&space, loader, &config(3))?.expect("grid has valid candidates");

    assert_eq!(single.score, triple.score);
    assert_eq!(single.parameters, triple.parameters);
    Ok(())
}

#[test]
fn searching_normalized_prices_and_replaying_raw_lines_up() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let run_settings = settings(0.0, 0.0);
    let harness = BacktestHarness::new(run_settings.clone());

    // Moves recorded against the delta-normalized series...
    let mut normalized = load_scenario_normalized(dir.path(), None)?;
    let normalized_stats = harness.run(&mut normalized, START_HORIZON, || {
        create_policy("mean_reversion", &HashMap::new(), 0.0)
    })?;

    // ...apply tick-for-tick against the raw series.
    let mut raw = load_scenario(dir.path(), None)?;
    let moves = normalized_stats.moves.clone();
    let raw_stats = harness.run(&mut raw, START_HORIZON, move || {
        Ok(Box::new(ReplayPolicy::new(moves)) as Box<dyn DecisionPolicy>)
    })?;

    assert_eq!(raw_stats.moves, normalized_stats.moves);
    assert_eq!(raw_stats.transaction_count, normalized_stats.transaction_count);
    Ok(())
}

#[test]
fn too_short_a_lookback_window_fails_the_first_tick() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let harness = BacktestHarness::new(settings(0.0, 0.0));
    let mut market = load_scenario(dir.path(), None)?;
    // average_crossing wants a 10-tick average; horizon 3 cannot supply it.
    let result = harness.run(&mut market, 3, || {
        create_policy(
            "average_crossing",
            &HashMap::from([("time_comp".to_string(), -10.0)]),
            0.0,
        )
    });

    assert!(matches!(
        result,
        Err(EngineError::LookaheadViolation { .. })
    ));
    Ok(())
}

#[test]
fn side_by_side_strategies_share_one_market() -> Result<()> {
    let dir = TempDir::new()?;
    write_test_scenario(dir.path())?;

    let harness = BacktestHarness::new(settings(500.0, 0.0));
    let mut market = load_scenario(dir.path(), None)?;
    let crossing_params = HashMap::from([("time_comp".to_string(), -4.0)]);
    let stats = harness.run_many(
        &mut market,
        START_HORIZON,
        vec![
            create_policy("cost_averaging", &cost_averaging_params(), 0.0)?,
            create_policy("average_crossing", &crossing_params, 0.0)?,
            create_policy("mean_reversion", &HashMap::new(), 0.0)?,
        ],
    )?;

    assert_eq!(stats.len(), 3);
    let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["cost_averaging", "average_crossing", "mean_reversion"]
    );
    for stat in &stats {
        assert!((stat.total_equity - (stat.capital + stat.stock_value)).abs() < 0.011);
    }
    Ok(())
}

#[test]
fn simulated_scenarios_round_trip_through_the_store() -> Result<()> {
    let dir = TempDir::new()?;
    let series = algolab::sim::generate(2, 60, 99);
    write_scenario(dir.path(), &series)?;

    let market = load_scenario(dir.path(), None)?;
    assert_eq!(market.len(), 2);
    assert_eq!(market.instrument("sim-0").unwrap().history_len(), 61);

    // Same seed, same files, same market.
    let again = algolab::sim::generate(2, 60, 99);
    assert_eq!(series, again);
    Ok(())
}

#[test]
fn market_halts_on_the_first_exhausted_instrument() -> Result<()> {
    let dir = TempDir::new()?;
    write_scenario(
        dir.path(),
        &[
            ("long".to_string(), (0..30).map(|i| 10.0 + i as f64).collect()),
            ("short".to_string(), (0..12).map(|i| 20.0 + i as f64).collect()),
        ],
    )?;

    let mut market: Market = load_scenario(dir.path(), None)?;
    market.rewind_all(5)?;
    assert_eq!(market.time_remaining(), 6);

    let harness = BacktestHarness::new(settings(0.0, 0.0));
    let mut market = load_scenario(dir.path(), None)?;
    let stats = harness.run(&mut market, 5, || {
        create_policy("cost_averaging", &cost_averaging_params(), 0.0)
    })?;

    // No recorded move can postdate the short series' final tick.
    let last_tick = 11u64;
    for tick in (last_tick + 1)..40 {
        assert!(stats.moves.lookup("long", tick).is_none());
        assert!(stats.moves.lookup("short", tick).is_none());
    }
    Ok(())
}
