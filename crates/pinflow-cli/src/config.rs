//! Scenario configuration parsing
//!
//! A scenario file (`pinflow.yaml`) declares a graph of nodes over JSON
//! values, the connections between them, and a script of steps that drives
//! the graph.
//!
//! ```yaml
//! name: orders
//! nodes:
//!   - { name: gate, kind: gate }
//!   - { name: dedup, kind: deduplicate }
//!   - { name: out, kind: sink }
//! connections:
//!   - { from: gate, to: dedup }
//!   - { from: dedup, to: out }
//! steps:
//!   - put: { node: gate, value: { id: 1 } }
//!   - open: gate
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScenarioError};

/// File name looked up when a directory is given to [`ScenarioConfig::load`]
pub const SCENARIO_FILE: &str = "pinflow.yaml";

/// Root scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Node declarations
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Output-to-input connections, applied in order
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,

    /// Steps run by the scenario, in order
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// A node declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    /// Gate emitting each chunk as a JSON array
    Gate { name: String },

    /// Removes repeated elements from JSON arrays
    Deduplicate { name: String },

    /// Emits each element of a JSON array separately
    Split { name: String },

    /// Passes values whose `field` is set (and equal to `equals`, if given)
    Filter {
        name: String,
        field: String,
        #[serde(default)]
        equals: Option<serde_json::Value>,
    },

    /// Records every value it receives
    Sink { name: String },

    /// Nestable opener in front of a gate's state pin
    Opener { name: String, gate: String },

    /// Nestable closer in front of a gate's state pin
    Closer { name: String, gate: String },
}

impl NodeConfig {
    /// Node name
    pub fn name(&self) -> &str {
        match self {
            Self::Gate { name }
            | Self::Deduplicate { name }
            | Self::Split { name }
            | Self::Filter { name, .. }
            | Self::Sink { name }
            | Self::Opener { name, .. }
            | Self::Closer { name, .. } => name,
        }
    }

    /// Gate controlled by this node, for openers and closers
    pub fn controlled_gate(&self) -> Option<&str> {
        match self {
            Self::Opener { gate, .. } | Self::Closer { gate, .. } => Some(gate.as_str()),
            _ => None,
        }
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Node whose output pin is connected
    pub from: String,
    /// Node whose input pin receives the values
    pub to: String,
}

/// A scripted step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepConfig {
    /// Put a value on a node's input pin
    Put {
        node: String,
        value: serde_json::Value,
    },

    /// Send `Open` to a gate, opener or closer
    Open(String),

    /// Send `Close` to a gate, opener or closer
    Close(String),
}

impl ScenarioConfig {
    /// Load a scenario from a file, or from `pinflow.yaml` inside a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_path = if path.is_dir() {
            path.join(SCENARIO_FILE)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            return Err(ScenarioError::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        Self::parse(&contents)
    }

    /// Parse a scenario from YAML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        if config.name.trim().is_empty() {
            return Err(ScenarioError::invalid("scenario name must not be empty"));
        }
        Ok(config)
    }
}
