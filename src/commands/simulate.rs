use crate::scenario;
use crate::sim;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(out_dir: &Path, instruments: usize, ticks: usize, seed: u64) -> Result<()> {
    let series = sim::generate(instruments, ticks, seed);
    scenario::write_scenario(out_dir, &series)?;
    info!(
        "Wrote {} simulated instrument(s) x {} ticks (seed {}) to {}",
        instruments,
        ticks,
        seed,
        out_dir.display()
    );
    Ok(())
}
