use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

use kgx::settings::Settings;
use kgx::store::{export_file_name, TripleStore};

pub fn execute(settings: &Settings, output: Option<PathBuf>) -> Result<()> {
    let store = TripleStore::open(&settings.store.path)
        .with_context(|| format!("Failed to open {}", settings.store.path.display()))?;
    let output = output.unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now())));

    let count = store
        .export_csv(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    cliclack::log::success(format!("Exported {} triples to {}", count, output.display()))?;
    Ok(())
}
