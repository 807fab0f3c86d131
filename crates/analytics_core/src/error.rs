//! Error types for plugin execution and configuration loading.

use std::any::Any;

/// Errors raised by plugins or by the timeline while running them.
///
/// The timeline never turns these into results itself. They reach the
/// caller of [`Timeline::push`](crate::Timeline::push) as-is, and the core
/// client converts them into zero-code dispatch results.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin setup failed; the plugin was not registered
    #[error("Plugin {name} setup failed: {reason}")]
    Setup { name: String, reason: String },
    /// Error raised by a plugin hook. Displays the raw message.
    #[error("{0}")]
    Execution(String),
    /// A plugin hook panicked
    #[error("Plugin panicked: {0}")]
    Panicked(String),
    /// The operation's completion was dropped before it settled
    #[error("Timeline operation was dropped before it settled")]
    Dropped,
}

impl PluginError {
    pub fn execution(message: impl Into<String>) -> Self {
        PluginError::Execution(message.into())
    }

    /// Converts a caught panic payload into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(s) = payload.downcast_ref::<&str>() {
            PluginError::Panicked(s.to_string())
        } else if let Some(s) = payload.downcast_ref::<String>() {
            PluginError::Panicked(s.clone())
        } else {
            PluginError::Panicked("unknown error".to_string())
        }
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
