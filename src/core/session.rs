use crate::core::output::Printer;
use crate::domain::model::{
    MemoryView, SessionReport, SessionState, SourceBuffer, SourceInput, StepOutcome, Trigger,
};
use crate::domain::ports::{Presenter, Simulator, SourceLoader, StagingFs};
use crate::utils::error::{Result, SpimError};
use chrono::{DateTime, Utc};

/// Everything a session needs, built once at startup.
pub struct ShellContext<L, F, S, P> {
    pub loader: L,
    pub fs: F,
    pub simulator: S,
    pub view: P,
    pub printer: Printer,
    pub stage_path: String,
    pub memory_view: MemoryView,
}

/// Application context: drives one simulator through load, step and run.
///
/// `Unloaded` until a load has acquired, staged and initialized a program;
/// `Ready` afterwards. Steps and runs do not change the state.
pub struct Session<L, F, S, P>
where
    L: SourceLoader,
    F: StagingFs,
    S: Simulator,
    P: Presenter,
{
    loader: L,
    fs: F,
    simulator: S,
    view: P,
    printer: Printer,
    stage_path: String,
    memory_view: MemoryView,
    state: SessionState,
    source: Option<SourceInput>,
    loaded_at: Option<DateTime<Utc>>,
}

impl<L, F, S, P> Session<L, F, S, P>
where
    L: SourceLoader,
    F: StagingFs,
    S: Simulator,
    P: Presenter,
{
    pub fn new(context: ShellContext<L, F, S, P>) -> Self {
        Self {
            loader: context.loader,
            fs: context.fs,
            simulator: context.simulator,
            view: context.view,
            printer: context.printer,
            stage_path: context.stage_path,
            memory_view: context.memory_view,
            state: SessionState::Unloaded,
            source: None,
            loaded_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    pub fn view(&self) -> &P {
        &self.view
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn memory_view(&self) -> MemoryView {
        self.memory_view
    }

    /// Acquire, stage, initialize, then show the first snapshots.
    ///
    /// Any failure leaves the session `Unloaded`.
    pub async fn load(&mut self, input: &SourceInput) -> Result<()> {
        tracing::info!("Loading program from {}", input);
        self.state = SessionState::Unloaded;
        self.source = None;
        self.loaded_at = None;

        let buffer = self.loader.load(input).await?;
        let staged = self.stage(&buffer)?;

        let path = self.fs.resolve(&self.stage_path);
        self.simulator.initialize(&path)?;

        self.state = SessionState::Ready;
        self.source = Some(input.clone());
        self.loaded_at = Some(Utc::now());
        tracing::info!("Program ready: {} bytes staged at {}", staged, path);

        self.view.show_registers(&self.simulator.get_all_registers())?;
        self.view.show_memory(&self.memory_snapshot())?;
        Ok(())
    }

    /// open → write the whole buffer at offset 0 → close.
    fn stage(&mut self, buffer: &SourceBuffer) -> Result<usize> {
        let handle = self.fs.open(&self.stage_path)?;

        let written = match self.fs.write(handle, &buffer.bytes, 0) {
            Ok(written) => written,
            Err(e) => {
                if let Err(close_err) = self.fs.close(handle) {
                    tracing::warn!("Closing {} after a failed write: {}", self.stage_path, close_err);
                }
                return Err(e);
            }
        };
        self.fs.close(handle)?;

        if written != buffer.len() {
            return Err(SpimError::staging(
                &self.stage_path,
                format!("short write: {} of {} bytes", written, buffer.len()),
            ));
        }

        tracing::debug!("Staged {} bytes at {}", written, self.stage_path);
        Ok(written)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Unloaded => Err(SpimError::NotLoaded),
        }
    }

    fn memory_snapshot(&self) -> String {
        match self.memory_view {
            MemoryView::UserText => self.simulator.get_user_text(),
            MemoryView::UserData => self.simulator.get_user_data(),
            MemoryView::UserStack => self.simulator.get_user_stack(),
            MemoryView::KernelText => self.simulator.get_kernel_text(),
        }
    }

    /// One facade call per trigger, then bring the output region up to date.
    pub fn click(&mut self, trigger: Trigger) -> Result<()> {
        self.ensure_ready()?;

        match trigger {
            Trigger::Step => {
                tracing::debug!("step");
                self.simulator.step();
            }
            Trigger::Run => {
                tracing::debug!("run");
                self.simulator.run();
            }
        }

        self.sync_output()
    }

    fn sync_output(&mut self) -> Result<()> {
        let view = &mut self.view;
        self.printer.with_region(|region| view.sync_output(region))
    }

    pub fn step(&mut self) -> Result<()> {
        self.click(Trigger::Step)
    }

    pub fn run(&mut self) -> Result<()> {
        self.click(Trigger::Run)
    }

    /// Executes up to `count` instructions in one facade call.
    pub fn step_many(&mut self, count: u32) -> Result<StepOutcome> {
        self.ensure_ready()?;

        tracing::debug!("step {}", count);
        let outcome = self.simulator.step_many(count);
        if outcome == StepOutcome::Breakpoint {
            tracing::info!("Breakpoint hit at 0x{:08x}", self.simulator.get_pc());
        }

        self.sync_output()?;
        Ok(outcome)
    }

    pub fn refresh_registers(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.view.show_registers(&self.simulator.get_all_registers())
    }

    /// Switches the memory region to `memory_view` and redraws it.
    pub fn show_memory(&mut self, memory_view: MemoryView) -> Result<()> {
        self.memory_view = memory_view;
        self.ensure_ready()?;
        self.view.show_memory(&self.memory_snapshot())
    }

    /// Draws PC, EPC, Cause, BadVAddr, Status, HI and LO in the register region.
    pub fn show_special_registers(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.view.show_registers(&self.simulator.get_special_registers())
    }

    pub fn register(&self, index: i32) -> Result<i32> {
        self.ensure_ready()?;
        Ok(self.simulator.get_register(index))
    }

    pub fn pc(&self) -> Result<u32> {
        self.ensure_ready()?;
        Ok(self.simulator.get_pc())
    }

    pub fn add_breakpoint(&mut self, address: u32) -> Result<()> {
        self.ensure_ready()?;
        tracing::debug!("Breakpoint set at 0x{:08x}", address);
        self.simulator.add_breakpoint(address);
        Ok(())
    }

    pub fn delete_breakpoint(&mut self, address: u32) -> Result<()> {
        self.ensure_ready()?;
        tracing::debug!("Breakpoint cleared at 0x{:08x}", address);
        self.simulator.delete_breakpoint(address);
        Ok(())
    }

    pub fn report(&self) -> SessionReport {
        let ready = self.state == SessionState::Ready;
        SessionReport {
            state: self.state,
            source: self.source.as_ref().map(|s| s.to_string()),
            loaded_at: self.loaded_at,
            memory_view: self.memory_view,
            registers: ready.then(|| self.simulator.get_all_registers()),
            memory: ready.then(|| self.memory_snapshot()),
            output_lines: self.printer.with_region(|region| region.line_count()),
        }
    }
}
