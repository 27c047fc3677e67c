use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpimError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Staging error at '{path}': {reason}")]
    Staging { path: String, reason: String },

    #[error("No program loaded; load a source before stepping or running")]
    NotLoaded,

    #[error("Simulator error: {message}")]
    Simulator { message: String },

    #[error("Simulator library is already bound in this process")]
    SimulatorInUse,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid command '{input}': {reason}")]
    InvalidCommand { input: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Acquisition,
    Staging,
    Simulator,
    Configuration,
    Command,
    Internal,
}

impl SpimError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpimError::Http(_) | SpimError::HttpStatus { .. } | SpimError::Io(_) => {
                ErrorCategory::Acquisition
            }
            SpimError::Staging { .. } => ErrorCategory::Staging,
            SpimError::NotLoaded | SpimError::Simulator { .. } | SpimError::SimulatorInUse => {
                ErrorCategory::Simulator
            }
            SpimError::ConfigError { .. }
            | SpimError::InvalidConfigValue { .. }
            | SpimError::TomlParse(_) => ErrorCategory::Configuration,
            SpimError::InvalidCommand { .. } => ErrorCategory::Command,
            SpimError::Serialization(_) => ErrorCategory::Internal,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Acquisition => format!("Could not load the assembly source: {}", self),
            ErrorCategory::Staging => format!("Could not stage the program for the simulator: {}", self),
            ErrorCategory::Simulator => format!("Simulator unavailable: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Command => format!("{} (type 'help' for the command list)", self),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }

    pub(crate) fn staging(path: &str, reason: impl Into<String>) -> Self {
        SpimError::Staging {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpimError>;
