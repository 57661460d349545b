//! Error types for scenario loading and wiring

use thiserror::Error;

/// Result type alias for scenario operations
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Errors raised while loading, building or running a scenario
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Scenario file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    ConfigInvalid { message: String },

    /// A scenario referenced a node that does not exist
    #[error("unknown node '{name}'")]
    UnknownNode { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A node in the graph failed while handling a step
    #[error(transparent)]
    Graph(#[from] pinflow_core::Error),
}

impl ScenarioError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinflow_core::Signal;

    #[test]
    fn test_graph_error_is_transparent() {
        let err = ScenarioError::from(pinflow_core::Error::UnbalancedSignal {
            controller: "nestable opener",
            signal: Signal::Close,
        });
        assert!(err.to_string().starts_with("unbalanced Close signal"));
    }
}
