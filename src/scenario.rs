use crate::error::EngineError;
use crate::market::Market;
use crate::series::TimeSeries;
use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Scenario directories hold one plain-text file per instrument, one price
/// per line in chronological order; the file name is the instrument name.
/// Files are loaded in name order so a reloaded scenario always yields the
/// same instrument iteration order.
pub fn load_scenario(dir: &Path, instruments: Option<&[String]>) -> Result<Market> {
    build_market(read_instrument_files(dir, instruments)?)
}

/// Loads a scenario with every series rebased to its first observation
/// (delta-from-first normalization). Searches run against the normalized
/// prices; the recorded moves are then replayed against the raw scenario.
pub fn load_scenario_normalized(dir: &Path, instruments: Option<&[String]>) -> Result<Market> {
    let mut files = read_instrument_files(dir, instruments)?;
    for (_, observations) in &mut files {
        let base = observations.first().copied().unwrap_or(0.0);
        for price in observations.iter_mut() {
            *price -= base;
        }
    }
    build_market(files)
}

/// Writes series out as a scenario directory consumable by `load_scenario`.
pub fn write_scenario(dir: &Path, series: &[(String, Vec<f64>)]) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create scenario directory {}", dir.display()))?;
    for (name, observations) in series {
        let path = dir.join(name);
        let mut file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for price in observations {
            writeln!(file, "{price}")
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

/// Cleaning pass for exported CSV price histories: drops the header line,
/// keeps the second column, strips currency symbols, and reverses to
/// chronological order. Output lands in `out_dir` under the file stem.
pub fn clean_scenario(raw_dir: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create scenario directory {}", out_dir.display()))?;

    let mut cleaned = 0usize;
    for entry in list_files(raw_dir)? {
        let name = entry
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("raw file {} has no usable name", entry.display()))?;
        let contents = fs::read_to_string(&entry)
            .with_context(|| format!("failed to read {}", entry.display()))?;

        let mut prices = Vec::new();
        for (line_no, line) in contents.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let raw = line
                .split(',')
                .nth(1)
                .ok_or_else(|| {
                    anyhow!("{}:{}: missing price column", entry.display(), line_no + 1)
                })?
                .trim()
                .trim_start_matches('$');
            let price: f64 = raw.parse().with_context(|| {
                format!("{}:{}: bad price `{}`", entry.display(), line_no + 1, raw)
            })?;
            prices.push(price);
        }
        prices.reverse();

        write_scenario(out_dir, &[(name.clone(), prices)])?;
        info!("Cleaned {} into {}", entry.display(), name);
        cleaned += 1;
    }

    if cleaned == 0 {
        return Err(anyhow!("no raw files found in {}", raw_dir.display()));
    }
    Ok(())
}

fn read_instrument_files(
    dir: &Path,
    instruments: Option<&[String]>,
) -> Result<Vec<(String, Vec<f64>)>> {
    let mut files = Vec::new();
    for path in list_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("scenario file {} has no usable name", path.display()))?;
        if let Some(filter) = instruments {
            if !filter.iter().any(|wanted| wanted == &name) {
                continue;
            }
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut observations = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let price: f64 = line.parse().with_context(|| {
                format!("{}:{}: bad price `{}`", path.display(), line_no + 1, line)
            })?;
            observations.push(price);
        }
        if observations.is_empty() {
            return Err(anyhow!("scenario file {} holds no prices", path.display()));
        }
        files.push((name, observations));
    }
    Ok(files)
}

fn list_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read scenario directory {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn build_market(files: Vec<(String, Vec<f64>)>) -> Result<Market> {
    let mut market = Market::new();
    for (name, observations) in files {
        market.add_series(TimeSeries::new(name, observations))?;
    }
    if market.is_empty() {
        return Err(EngineError::EmptyScenario.into());
    }
    Ok(market)
}
