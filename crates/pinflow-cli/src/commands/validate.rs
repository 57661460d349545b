//! Validate scenario command

use anyhow::{Context, Result};

use crate::config::ScenarioConfig;
use crate::scenario::Scenario;

/// Run the validate command
pub fn run(config_path: &str) -> Result<()> {
    tracing::info!("Validating scenario: {}", config_path);

    let config = ScenarioConfig::load(config_path).context("Failed to load scenario")?;

    tracing::info!("✓ Scenario: {}", config.name);
    if let Some(description) = &config.description {
        tracing::info!("  {}", description);
    }

    let scenario = Scenario::build(&config).context("Failed to build scenario graph")?;

    tracing::info!("✓ Nodes: {}", scenario.node_count());
    tracing::info!("✓ Connections: {}", config.connections.len());
    tracing::info!("✓ Steps: {}", config.steps.len());
    tracing::info!("✓ Scenario is valid");
    Ok(())
}
