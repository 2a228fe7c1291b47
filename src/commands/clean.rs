use crate::scenario;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(raw_dir: &Path, out_dir: &Path) -> Result<()> {
    scenario::clean_scenario(raw_dir, out_dir)?;
    info!(
        "Cleaned raw price exports from {} into {}",
        raw_dir.display(),
        out_dir.display()
    );
    Ok(())
}
