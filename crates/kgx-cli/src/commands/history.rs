use anyhow::{Context, Result};

use kgx::settings::Settings;
use kgx::store::TripleStore;

use crate::render::{print_markdown, records_table};

pub fn execute(settings: &Settings, limit: Option<usize>, json: bool) -> Result<()> {
    let store = TripleStore::open(&settings.store.path)
        .with_context(|| format!("Failed to open {}", settings.store.path.display()))?;
    let mut records = store.fetch_triples()?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        cliclack::log::info("No triples have been extracted yet")?;
        return Ok(());
    }

    print_markdown(&records_table(&records))
}
