use crate::config::ShellSettings;
use crate::domain::model::MemoryView;
use crate::utils::error::{Result, SpimError};
use crate::utils::logger::LogFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional shell configuration file. Every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: Option<SourceConfig>,
    pub staging: Option<StagingConfig>,
    pub display: Option<DisplayConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub location: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingConfig {
    pub root: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub memory_view: Option<MemoryView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses `content` after replacing `${VAR}` with environment values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SpimError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Overwrites the settings this file specifies.
    pub fn apply_to(&self, settings: &mut ShellSettings) {
        if let Some(source) = &self.source {
            if let Some(location) = &source.location {
                settings.source = location.clone();
            }
            if let Some(timeout) = source.timeout_seconds {
                settings.timeout_seconds = timeout;
            }
        }

        if let Some(staging) = &self.staging {
            if let Some(root) = &staging.root {
                settings.stage_root = PathBuf::from(root);
            }
            if let Some(path) = &staging.path {
                settings.stage_path = path.clone();
            }
        }

        if let Some(memory_view) = self.display.as_ref().and_then(|d| d.memory_view) {
            settings.memory_view = memory_view;
        }

        if let Some(logging) = &self.logging {
            if logging.level.is_some() {
                settings.log_level = logging.level.clone();
            }
            if let Some(format) = logging.format {
                settings.log_format = format;
            }
        }
    }
}
