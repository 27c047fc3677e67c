use crate::utils::error::{Result, SpimError};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Filter for the crate's own events at `level` (`trace` .. `error`, `off`).
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(format!("spim_shell={}", level)).map_err(|e| SpimError::InvalidConfigValue {
        field: "logging.level".to_string(),
        value: level.to_string(),
        reason: e.to_string(),
    })
}

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match (verbose, level) {
        (true, _) => EnvFilter::new("spim_shell=debug,info"),
        (false, Some(level)) => {
            level_filter(level).unwrap_or_else(|_| EnvFilter::new("spim_shell=info"))
        }
        (false, None) => EnvFilter::new("spim_shell=info"),
    })
}

pub fn init_cli_logger(verbose: bool, level: Option<&str>, format: LogFormat) {
    let filter = default_filter(verbose, level);

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .json(),
            )
            .init(),
    }
}
