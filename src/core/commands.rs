use crate::domain::model::{MemoryView, SourceInput, Trigger};
use crate::utils::error::SpimError;
use std::str::FromStr;

pub const HELP: &str = "\
step            execute one instruction
step <n>        execute up to n instructions, stopping at breakpoints
run             run until the program halts or hits a breakpoint
regs            show all registers
sregs           show PC, EPC, Cause, BadVAddr, Status, HI and LO
text            show the user text segment
data            show the user data segment
stack           show the user stack
ktext           show the kernel text segment
reg <n>         print register n
pc              print the program counter
break <addr>    set a breakpoint (hex with 0x, or decimal)
delete <addr>   clear a breakpoint
load <source>   load a program from a path or URL
report          print the session as JSON
help            show this list
quit            leave the shell";

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Click(Trigger),
    StepMany(u32),
    Registers,
    SpecialRegisters,
    Memory(MemoryView),
    Register(i32),
    Pc,
    Breakpoint(u32),
    DeleteBreakpoint(u32),
    Load(SourceInput),
    Report,
    Help,
    Quit,
}

fn invalid(input: &str, reason: &str) -> SpimError {
    SpimError::InvalidCommand {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_address(line: &str, text: &str) -> Result<u32, SpimError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|_| invalid(line, "expected an address"))
}

impl FromStr for Command {
    type Err = SpimError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "step" if rest.is_empty() => Command::Click(Trigger::Step),
            "step" => match rest.parse::<u32>() {
                Ok(count) if count > 0 => Command::StepMany(count),
                _ => return Err(invalid(line, "expected a positive instruction count")),
            },
            "run" => Command::Click(Trigger::Run),
            "regs" => Command::Registers,
            "sregs" => Command::SpecialRegisters,
            "text" => Command::Memory(MemoryView::UserText),
            "data" => Command::Memory(MemoryView::UserData),
            "stack" => Command::Memory(MemoryView::UserStack),
            "ktext" => Command::Memory(MemoryView::KernelText),
            "reg" => {
                let index = rest
                    .parse::<i32>()
                    .map_err(|_| invalid(line, "expected a register number"))?;
                Command::Register(index)
            }
            "pc" => Command::Pc,
            "break" => Command::Breakpoint(parse_address(line, rest)?),
            "delete" => Command::DeleteBreakpoint(parse_address(line, rest)?),
            "load" => {
                if rest.is_empty() {
                    return Err(invalid(line, "expected a path or URL"));
                }
                Command::Load(SourceInput::parse(rest))
            }
            "report" => Command::Report,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => return Err(invalid(line, "empty input")),
            _ => return Err(invalid(line, "unknown command")),
        };

        let takes_argument = matches!(
            command,
            Command::StepMany(_)
                | Command::Register(_)
                | Command::Breakpoint(_)
                | Command::DeleteBreakpoint(_)
                | Command::Load(_)
        );
        if !takes_argument && !rest.is_empty() {
            return Err(invalid(line, "unexpected argument"));
        }

        Ok(command)
    }
}
