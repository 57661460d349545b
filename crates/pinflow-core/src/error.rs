//! Error types for pinflow-core

use thiserror::Error;

use crate::gate::Signal;

/// Result type alias for pinflow-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a caller-supplied function
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in pinflow-core
#[derive(Error, Debug)]
pub enum Error {
    /// A converter, filter or actor function failed while handling a value
    #[error("callback failed: {0}")]
    Callback(#[source] BoxError),

    /// A nestable controller received more releasing signals than acquiring ones
    #[error("unbalanced {signal:?} signal on {controller}: counter would drop below zero")]
    UnbalancedSignal {
        /// Controller kind (`nestable opener` or `nestable closer`)
        controller: &'static str,
        /// The signal that could not be matched
        signal: Signal,
    },

    /// A nestable controller counter reached its upper bound
    #[error("{controller} counter overflow")]
    CounterOverflow {
        /// Controller kind
        controller: &'static str,
    },
}

impl Error {
    /// Wrap any error (or message) raised by a user function
    pub fn callback(err: impl Into<BoxError>) -> Self {
        Self::Callback(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_from_message() {
        let err = Error::callback("boom");
        assert_eq!(err.to_string(), "callback failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unbalanced_signal_message() {
        let err = Error::UnbalancedSignal {
            controller: "nestable opener",
            signal: Signal::Close,
        };
        assert!(err.to_string().contains("nestable opener"));
        assert!(err.to_string().contains("Close"));
    }
}
