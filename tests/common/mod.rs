#![allow(dead_code)]

use async_trait::async_trait;
use spim_shell::domain::model::{
    FileHandle, OutputRegion, SourceBuffer, SourceInput, StepOutcome,
};
use spim_shell::domain::ports::{Presenter, Simulator, SourceLoader, StagingFs};
use spim_shell::{MemFs, Printer, Result, SpimError};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

pub const TEXT_BASE: u32 = 0x0040_0000;
pub const DATA_BASE: u32 = 0x1001_0000;

/// Shared record of calls across the fakes, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }
}

/// Serves fixed bytes for any input, or fails with a 503.
pub struct StaticLoader {
    pub bytes: Option<Vec<u8>>,
    pub log: CallLog,
}

impl StaticLoader {
    pub fn new(program: &str, log: CallLog) -> Self {
        Self {
            bytes: Some(program.as_bytes().to_vec()),
            log,
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self { bytes: None, log }
    }
}

#[async_trait]
impl SourceLoader for StaticLoader {
    async fn load(&self, input: &SourceInput) -> Result<SourceBuffer> {
        self.log.push("load");
        match &self.bytes {
            Some(bytes) => Ok(SourceBuffer {
                input: input.clone(),
                bytes: bytes.clone(),
            }),
            None => Err(SpimError::HttpStatus {
                url: input.to_string(),
                status: 503,
            }),
        }
    }
}

/// How `RecordingFs::write` misbehaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteFault {
    #[default]
    None,
    /// Fails without writing anything.
    Error,
    /// Writes only the first half of the data.
    Short,
}

/// `MemFs` that records each filesystem call.
pub struct RecordingFs {
    pub inner: MemFs,
    pub log: CallLog,
    pub fault: WriteFault,
}

impl StagingFs for RecordingFs {
    fn open(&mut self, path: &str) -> Result<FileHandle> {
        self.log.push("open");
        self.inner.open(path)
    }

    fn write(&mut self, handle: FileHandle, data: &[u8], position: u64) -> Result<usize> {
        self.log.push("write");
        match self.fault {
            WriteFault::None => self.inner.write(handle, data, position),
            WriteFault::Error => Err(SpimError::Io(std::io::Error::other(
                "no space left on device",
            ))),
            WriteFault::Short => self.inner.write(handle, &data[..data.len() / 2], position),
        }
    }

    fn close(&mut self, handle: FileHandle) -> Result<()> {
        self.log.push("close");
        self.inner.close(handle)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.inner.read(path)
    }
}

#[derive(Debug, Clone)]
enum Instr {
    Li(usize, i32),
    Addi(usize, usize, i32),
    Print(usize),
}

fn reg(token: &str) -> Option<usize> {
    token
        .trim()
        .trim_end_matches(',')
        .strip_prefix('$')?
        .parse()
        .ok()
        .filter(|r: &usize| *r < 8)
}

fn imm(token: &str) -> Option<i32> {
    token.trim().parse().ok()
}

fn parse_line(line: &str) -> Option<Instr> {
    let (op, rest) = line.split_once(char::is_whitespace)?;
    let args: Vec<&str> = rest.split(',').map(str::trim).collect();
    match (op, args.as_slice()) {
        ("li", [rd, value]) => Some(Instr::Li(reg(rd)?, imm(value)?)),
        ("addi", [rd, rs, value]) => Some(Instr::Addi(reg(rd)?, reg(rs)?, imm(value)?)),
        ("print", [rs]) => Some(Instr::Print(reg(rs)?)),
        _ => None,
    }
}

/// Tiny stand-in for the simulator: eight registers and three instructions
/// (`li`, `addi`, `print`), read from the staged file on initialize.
///
/// Instruction `i` sits at `TEXT_BASE + 4 * i`. Registers are mirrored into
/// the data segment at `DATA_BASE + 4 * r`.
pub struct FakeSpim {
    fs: MemFs,
    printer: Printer,
    log: CallLog,
    source: Vec<String>,
    program: Vec<Instr>,
    pc: usize,
    regs: [i32; 8],
    breakpoints: BTreeSet<u32>,
}

impl FakeSpim {
    pub fn new(fs: MemFs, printer: Printer, log: CallLog) -> Self {
        Self {
            fs,
            printer,
            log,
            source: Vec::new(),
            program: Vec::new(),
            pc: 0,
            regs: [0; 8],
            breakpoints: BTreeSet::new(),
        }
    }

    pub fn program_len(&self) -> usize {
        self.program.len()
    }

    pub fn breakpoints(&self) -> Vec<u32> {
        self.breakpoints.iter().copied().collect()
    }

    fn address(&self) -> u32 {
        TEXT_BASE + 4 * self.pc as u32
    }

    fn finished(&self) -> bool {
        self.pc >= self.program.len()
    }

    /// Executes up to `budget` instructions; a breakpoint on the first one is
    /// stepped over.
    fn advance(&mut self, budget: Option<u32>) -> StepOutcome {
        let mut executed = 0u32;
        loop {
            if self.finished() {
                return StepOutcome::Finished;
            }
            if budget.is_some_and(|budget| executed >= budget) {
                return StepOutcome::Running;
            }
            if executed > 0 && self.breakpoints.contains(&self.address()) {
                return StepOutcome::Breakpoint;
            }
            self.execute();
            executed += 1;
        }
    }

    fn execute(&mut self) {
        let Some(instr) = self.program.get(self.pc).cloned() else {
            return;
        };
        match instr {
            Instr::Li(rd, value) => self.regs[rd] = value,
            Instr::Addi(rd, rs, value) => self.regs[rd] = self.regs[rs] + value,
            Instr::Print(rs) => self.printer.print(&self.regs[rs].to_string()),
        }
        self.pc += 1;
    }
}

impl Simulator for FakeSpim {
    fn initialize(&mut self, path: &str) -> Result<()> {
        self.log.push("initialize");
        let bytes = self.fs.read(path)?;
        let text = String::from_utf8_lossy(&bytes);

        self.source.clear();
        self.program.clear();
        self.pc = 0;
        self.regs = [0; 8];

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.ends_with(':') {
                continue;
            }
            match parse_line(line) {
                Some(instr) => {
                    self.source.push(line.to_string());
                    self.program.push(instr);
                }
                None => self.printer.print_err(&format!("syntax error: {}", line)),
            }
        }
        Ok(())
    }

    fn step(&mut self) {
        self.log.push("step");
        self.execute();
    }

    fn run(&mut self) {
        self.log.push("run");
        self.advance(None);
    }

    fn step_many(&mut self, count: u32) -> StepOutcome {
        self.log.push("step_many");
        self.advance(Some(count))
    }

    fn get_all_registers(&self) -> String {
        let mut out = String::new();
        for (i, value) in self.regs.iter().enumerate() {
            out.push_str(&format!("R{:<2} = {:08x}\n", i, value));
        }
        out.push_str(&self.get_special_registers());
        out
    }

    fn get_special_registers(&self) -> String {
        let mut out = format!("{:<8} = {:08x}\n", "PC", self.address());
        for name in ["EPC", "Cause", "BadVAddr", "Status", "HI", "LO"] {
            out.push_str(&format!("{:<8} = {:08x}\n", name, 0));
        }
        out
    }

    fn get_user_text(&self) -> String {
        self.source
            .iter()
            .enumerate()
            .map(|(i, line)| format!("[0x{:08x}] {}\n", TEXT_BASE as usize + 4 * i, line))
            .collect()
    }

    fn get_user_data(&self) -> String {
        self.regs
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(r, value)| format!("[0x{:08x}] 0x{:08x}\n", DATA_BASE as usize + 4 * r, value))
            .collect()
    }

    fn get_user_stack(&self) -> String {
        "[0x7ffffffc] 0x00000000\n".to_string()
    }

    fn get_kernel_text(&self) -> String {
        "[0x80000180] 0x00000000  nop\n".to_string()
    }

    fn get_register(&self, index: i32) -> i32 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.regs.get(i).copied())
            .unwrap_or(0)
    }

    fn get_pc(&self) -> u32 {
        self.address()
    }

    fn add_breakpoint(&mut self, address: u32) {
        self.log.push("add_breakpoint");
        self.breakpoints.insert(address);
    }

    fn delete_breakpoint(&mut self, address: u32) {
        self.log.push("delete_breakpoint");
        self.breakpoints.remove(&address);
    }
}

/// Keeps region contents in memory and counts redraws.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub registers: String,
    pub memory: String,
    pub output: String,
    pub register_draws: usize,
    pub memory_draws: usize,
    output_cursor: usize,
}

impl Presenter for RecordingView {
    fn show_registers(&mut self, text: &str) -> Result<()> {
        self.registers = text.to_string();
        self.register_draws += 1;
        Ok(())
    }

    fn show_memory(&mut self, text: &str) -> Result<()> {
        self.memory = text.to_string();
        self.memory_draws += 1;
        Ok(())
    }

    fn sync_output(&mut self, region: &OutputRegion) -> Result<()> {
        self.output.push_str(region.since(self.output_cursor));
        self.output_cursor = region.len();
        Ok(())
    }
}
