pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(all(unix, feature = "spim"))]
pub use adapters::spim::SpimFfi;

pub use adapters::{source::SourceAcquirer, staging::HostFs, staging::MemFs, terminal::TerminalView};
pub use config::ShellSettings;
pub use crate::core::{
    commands::Command,
    output::Printer,
    session::{Session, ShellContext},
};
pub use utils::error::{Result, SpimError};
