// ---------------------------------------------------------------------------
// ConfigError: problems with the scene/controller configuration
// ---------------------------------------------------------------------------

use std::fmt;
use std::path::PathBuf;

use crate::phase_channel::ChannelError;
use crate::vehicle::RouteError;

/// Errors that make a configuration unusable. Fatal at startup only; nothing
/// in the frame loop produces these.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for `SimConfig`.
    Parse(serde_json::Error),
    /// A vehicle's route geometry or speed is inconsistent.
    InvalidRoute { vehicle: String, source: RouteError },
    /// A vehicle colour is not a hex string like `#3b82f6`.
    InvalidColor { vehicle: String, value: String },
    /// A zero retry delay would reconnect in a tight loop.
    InvalidRetryDelay,
    /// The controller address cannot be dialled.
    Channel(ChannelError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
            ConfigError::InvalidRoute { vehicle, source } => {
                write!(f, "vehicle '{vehicle}': {source}")
            }
            ConfigError::InvalidColor { vehicle, value } => {
                write!(f, "vehicle '{vehicle}': invalid colour '{value}'")
            }
            ConfigError::InvalidRetryDelay => {
                write!(f, "controller retry delay must be greater than zero")
            }
            ConfigError::Channel(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::InvalidRoute { source, .. } => Some(source),
            ConfigError::Channel(e) => Some(e),
            ConfigError::InvalidColor { .. } | ConfigError::InvalidRetryDelay => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<ChannelError> for ConfigError {
    fn from(e: ChannelError) -> Self {
        ConfigError::Channel(e)
    }
}
