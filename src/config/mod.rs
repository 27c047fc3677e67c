pub mod toml_config;

use crate::domain::model::{MemoryView, SourceInput, DEFAULT_SOURCE, DEFAULT_STAGE_PATH};
use crate::utils::error::{Result, SpimError};
use crate::utils::logger::{level_filter, LogFormat};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_relative_path,
    validate_url, Validate,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "spim-shell")]
#[command(about = "Load a MIPS assembly program into SPIM and step through it")]
pub struct CliConfig {
    /// Assembly source: a local path or an http(s) URL
    #[arg(long)]
    pub source: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Directory the simulator reads staged programs from
    #[arg(long)]
    pub stage_root: Option<String>,

    /// Path of the staged program inside the staging root
    #[arg(long)]
    pub stage_path: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Segment shown in the memory region
    #[arg(long, value_enum)]
    pub memory_view: Option<MemoryView>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Effective settings: defaults, then the TOML file, then CLI flags.
#[derive(Debug, Clone, Serialize)]
pub struct ShellSettings {
    pub source: String,
    pub stage_root: PathBuf,
    pub stage_path: String,
    pub timeout_seconds: u64,
    pub memory_view: MemoryView,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
    pub verbose: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            stage_root: PathBuf::from("."),
            stage_path: DEFAULT_STAGE_PATH.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            memory_view: MemoryView::default(),
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
        }
    }
}

impl ShellSettings {
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(path) = &cli.config {
            toml_config::TomlConfig::from_file(path)?.apply_to(&mut settings);
        }

        if let Some(source) = &cli.source {
            settings.source = source.clone();
        }
        if let Some(root) = &cli.stage_root {
            settings.stage_root = PathBuf::from(root);
        }
        if let Some(path) = &cli.stage_path {
            settings.stage_path = path.clone();
        }
        if let Some(timeout) = cli.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        if let Some(memory_view) = cli.memory_view {
            settings.memory_view = memory_view;
        }
        if let Some(format) = cli.log_format {
            settings.log_format = format;
        }
        settings.verbose = cli.verbose;

        Ok(settings)
    }

    pub fn source_input(&self) -> SourceInput {
        SourceInput::parse(&self.source)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Validate for ShellSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("source", &self.source)?;
        match self.source_input() {
            SourceInput::Remote(url) => validate_url("source", &url)?,
            SourceInput::LocalFile(path) => {
                let path = path.to_string_lossy();
                validate_path("source", &path)?;
                // a scheme other than http(s) or file
                if path.contains("://") {
                    return Err(SpimError::InvalidConfigValue {
                        field: "source".to_string(),
                        value: self.source.clone(),
                        reason: "Unsupported URL scheme".to_string(),
                    });
                }
            }
        }

        validate_path("stage_root", &self.stage_root.to_string_lossy())?;
        validate_relative_path("stage_path", &self.stage_path)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
        if let Some(level) = &self.log_level {
            level_filter(level)?;
        }
        Ok(())
    }
}
