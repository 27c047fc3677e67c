use crate::domain::model::{FileHandle, OutputRegion, SourceBuffer, SourceInput, StepOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Resolves a source location into its complete contents. One attempt, no retry.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn load(&self, input: &SourceInput) -> Result<SourceBuffer>;
}

/// The filesystem the simulator opens programs from.
pub trait StagingFs {
    /// Opens `path` for writing, truncating any previous contents.
    fn open(&mut self, path: &str) -> Result<FileHandle>;

    /// Writes all of `data` at byte `position`. Returns the number of bytes written.
    fn write(&mut self, handle: FileHandle, data: &[u8], position: u64) -> Result<usize>;

    fn close(&mut self, handle: FileHandle) -> Result<()>;

    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// The path under which the simulator sees `path`.
    fn resolve(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Entry points exported by the simulator.
///
/// `initialize` must succeed before any other call. `step`, `run` and
/// `step_many` start past a breakpoint sitting on the current instruction;
/// `run` and `step_many` stop at the next one.
pub trait Simulator {
    fn initialize(&mut self, path: &str) -> Result<()>;
    fn step(&mut self);
    fn run(&mut self);
    /// Executes up to `count` instructions.
    fn step_many(&mut self, count: u32) -> StepOutcome;
    fn get_all_registers(&self) -> String;
    /// PC, EPC, Cause, BadVAddr, Status, HI and LO.
    fn get_special_registers(&self) -> String;
    fn get_user_text(&self) -> String;
    /// Non-zero words of the user data segment.
    fn get_user_data(&self) -> String;
    fn get_user_stack(&self) -> String;
    fn get_kernel_text(&self) -> String;
    fn get_register(&self, index: i32) -> i32;
    fn get_pc(&self) -> u32;
    fn add_breakpoint(&mut self, address: u32);
    fn delete_breakpoint(&mut self, address: u32);
}

/// Display regions of the shell. Snapshots replace the region's text.
pub trait Presenter {
    fn show_registers(&mut self, text: &str) -> Result<()>;
    fn show_memory(&mut self, text: &str) -> Result<()>;
    /// Brings the output region on screen up to date with `region`.
    fn sync_output(&mut self, region: &OutputRegion) -> Result<()>;
}
