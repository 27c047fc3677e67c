pub mod commands;
pub mod output;
pub mod session;

pub use crate::domain::model::{
    MemoryView, OutputRegion, SessionState, SourceInput, StepOutcome, Trigger,
};
pub use crate::domain::ports::{Presenter, Simulator, SourceLoader, StagingFs};
pub use crate::utils::error::Result;
