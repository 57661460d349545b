//! Run a scenario

use anyhow::{Context, Result};
use std::io::Write;

use crate::config::ScenarioConfig;
use crate::scenario::Scenario;

/// Run the scenario's steps and print every sink record as a JSON line
pub fn run(config_path: &str, pretty: bool) -> Result<()> {
    tracing::info!("Loading scenario from {}", config_path);

    let config = ScenarioConfig::load(config_path).context("Failed to load scenario")?;
    let scenario = Scenario::build(&config).context("Failed to build scenario graph")?;

    tracing::info!(
        "Scenario: {} ({} nodes, {} steps)",
        scenario.name(),
        scenario.node_count(),
        config.steps.len()
    );

    let records = scenario
        .run()
        .with_context(|| format!("Scenario '{}' failed", scenario.name()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        let line = if pretty {
            serde_json::to_string_pretty(record)?
        } else {
            serde_json::to_string(record)?
        };
        writeln!(out, "{}", line)?;
    }

    tracing::info!("✓ {} record(s) delivered", records.len());
    Ok(())
}
