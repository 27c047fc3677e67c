//! Binding to the SPIM simulator library.
//!
//! Targets the libspim built from the bundled `spim/spim.cpp` front end, whose
//! C exports are `init()`, `step(int, bool) -> int`, `getUserText`,
//! `getKernelText`, `getUserData(bool)`, `getUserStack(bool)`,
//! `getGeneralReg(bool)`, `getSpecialReg(bool)`, `getPC`, `addBreakpoint` and
//! `deleteBreakpoint`. The JavaScript build's `cwrap` names (`get_all_regs`,
//! `get_reg`, `run`, `init(path)`) are not exported by it and not bound here.
//!
//! That front end has no run entry point and no single-register read: `run`
//! repeats `step(0, ..)` until the program stops, and `get_register` reads the
//! general register dump. `init()` always assembles `input.s` from the working
//! directory, so the program must be staged there.
//!
//! The library keeps all machine state in C globals, so only one [`SpimFfi`]
//! may exist per process. Strings it returns point into a buffer it reuses on
//! the next call; they are copied out before anything else is called.
//!
//! Program output goes to the C `stdout`; it is captured around every call
//! that executes code and forwarded line by line to the shell's print channel.
//! Assembler and runtime errors arrive on stderr.

use crate::adapters::capture::{LineBuffer, StdoutCapture};
use crate::adapters::spim_text::{register_value, strip_pre};
use crate::core::output::Printer;
use crate::domain::model::StepOutcome;
use crate::domain::ports::Simulator;
use crate::utils::error::{Result, SpimError};
use std::ffi::{c_char, c_int, CStr};
use std::marker::PhantomData;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicBool, Ordering};

/// The only file `init()` reads.
pub const SPIM_INPUT: &str = "input.s";

// libspim substitutes its default run budget for a zero step size
const RUN_CHUNK: c_int = 0;

#[link(name = "spim")]
extern "C" {
    #[link_name = "init"]
    fn spim_init();
    #[link_name = "step"]
    fn spim_step(step_size: c_int, cont_bkpt: bool) -> c_int;
    #[link_name = "getUserText"]
    fn spim_get_user_text() -> *const c_char;
    #[link_name = "getKernelText"]
    fn spim_get_kernel_text() -> *const c_char;
    #[link_name = "getUserData"]
    fn spim_get_user_data(compute_diff: bool) -> *const c_char;
    #[link_name = "getUserStack"]
    fn spim_get_user_stack(compute_diff: bool) -> *const c_char;
    #[link_name = "getGeneralReg"]
    fn spim_get_general_reg(compute_diff: bool) -> *const c_char;
    #[link_name = "getSpecialReg"]
    fn spim_get_special_reg(compute_diff: bool) -> *const c_char;
    #[link_name = "getPC"]
    fn spim_get_pc() -> c_int;
    #[link_name = "addBreakpoint"]
    fn spim_add_breakpoint(address: u32);
    #[link_name = "deleteBreakpoint"]
    fn spim_delete_breakpoint(address: u32);
}

static BOUND: AtomicBool = AtomicBool::new(false);

/// Copies a string owned by the library.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn take_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

fn outcome(code: c_int) -> StepOutcome {
    match code {
        0 => StepOutcome::Finished,
        -1 => StepOutcome::Breakpoint,
        _ => StepOutcome::Running,
    }
}

/// `input.s` or `./input.s`: what `init()` opens relative to the working directory.
fn is_spim_input(path: &str) -> bool {
    let mut components = Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == SPIM_INPUT
    )
}

#[derive(Debug)]
pub struct SpimFfi {
    printer: Printer,
    lines: LineBuffer,
    // library state is global and not thread-safe
    _not_send: PhantomData<*const ()>,
}

impl SpimFfi {
    /// Claims the process-wide simulator. Fails if another binding is alive.
    ///
    /// Program output is appended to `printer`'s region.
    pub fn acquire(printer: Printer) -> Result<Self> {
        BOUND
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SpimError::SimulatorInUse)?;
        Ok(Self {
            printer,
            lines: LineBuffer::new(),
            _not_send: PhantomData,
        })
    }

    /// Runs `call` with stdout redirected and prints whatever it wrote.
    fn captured<T>(&mut self, call: impl FnOnce() -> T) -> T {
        let capture = match StdoutCapture::begin() {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!("Program output not captured: {}", e);
                return call();
            }
        };

        let result = call();

        match capture.finish() {
            Ok(bytes) => {
                for line in self.lines.push(&bytes) {
                    self.printer.print(&line);
                }
            }
            Err(e) => tracing::warn!("Lost program output: {}", e),
        }
        result
    }

    fn general_registers(&self) -> String {
        strip_pre(&unsafe { take_string(spim_get_general_reg(false)) })
    }
}

impl Drop for SpimFfi {
    fn drop(&mut self) {
        if !self.lines.pending().is_empty() {
            self.printer.print(self.lines.pending());
        }
        BOUND.store(false, Ordering::Release);
    }
}

impl Simulator for SpimFfi {
    fn initialize(&mut self, path: &str) -> Result<()> {
        if !is_spim_input(path) {
            return Err(SpimError::Simulator {
                message: format!(
                    "libspim only assembles {} from the working directory, not {}",
                    SPIM_INPUT, path
                ),
            });
        }

        tracing::debug!("spim: init()");
        self.lines = LineBuffer::new();
        self.captured(|| unsafe { spim_init() });
        Ok(())
    }

    fn step(&mut self) {
        self.captured(|| unsafe { spim_step(1, true) });
    }

    fn run(&mut self) {
        let mut cont_bkpt = true;
        loop {
            let code = self.captured(|| unsafe { spim_step(RUN_CHUNK, cont_bkpt) });
            if outcome(code) != StepOutcome::Running {
                break;
            }
            cont_bkpt = false;
        }
    }

    fn step_many(&mut self, count: u32) -> StepOutcome {
        let count = c_int::try_from(count).unwrap_or(c_int::MAX).max(1);
        outcome(self.captured(|| unsafe { spim_step(count, true) }))
    }

    fn get_all_registers(&self) -> String {
        let mut text = self.general_registers();
        text.push_str(&self.get_special_registers());
        text
    }

    fn get_special_registers(&self) -> String {
        strip_pre(&unsafe { take_string(spim_get_special_reg(false)) })
    }

    fn get_user_text(&self) -> String {
        strip_pre(&unsafe { take_string(spim_get_user_text()) })
    }

    fn get_user_data(&self) -> String {
        strip_pre(&unsafe { take_string(spim_get_user_data(false)) })
    }

    fn get_user_stack(&self) -> String {
        strip_pre(&unsafe { take_string(spim_get_user_stack(false)) })
    }

    fn get_kernel_text(&self) -> String {
        strip_pre(&unsafe { take_string(spim_get_kernel_text()) })
    }

    fn get_register(&self, index: i32) -> i32 {
        register_value(&self.general_registers(), index).unwrap_or(0)
    }

    fn get_pc(&self) -> u32 {
        unsafe { spim_get_pc() as u32 }
    }

    fn add_breakpoint(&mut self, address: u32) {
        unsafe { spim_add_breakpoint(address) }
    }

    fn delete_breakpoint(&mut self, address: u32) {
        unsafe { spim_delete_breakpoint(address) }
    }
}
