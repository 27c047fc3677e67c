use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_SOURCE: &str = "https://raw.githubusercontent.com/ShawnZhong/JsSpim/dev/Tests/fib.s";
pub const DEFAULT_STAGE_PATH: &str = "input.s";

/// Where an assembly program comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum SourceInput {
    LocalFile(PathBuf),
    Remote(String),
}

impl SourceInput {
    /// `http(s)://` locations are remote, `file://` URLs and everything else
    /// are local paths.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                SourceInput::Remote(location.to_string())
            }
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => SourceInput::LocalFile(path),
                Err(()) => SourceInput::LocalFile(PathBuf::from(location)),
            },
            _ => SourceInput::LocalFile(PathBuf::from(location)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceInput::Remote(_))
    }
}

impl FromStr for SourceInput {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SourceInput::parse(s))
    }
}

impl fmt::Display for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceInput::LocalFile(path) => write!(f, "{}", path.display()),
            SourceInput::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Complete contents of an acquired source.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    pub input: SourceInput,
    pub bytes: Vec<u8>,
}

impl SourceBuffer {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Opaque handle to an open file in a staging filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Unloaded,
    Ready,
}

/// Which memory segment the memory region shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MemoryView {
    #[default]
    UserText,
    UserData,
    UserStack,
    KernelText,
}

impl fmt::Display for MemoryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryView::UserText => "user text",
            MemoryView::UserData => "user data",
            MemoryView::UserStack => "user stack",
            MemoryView::KernelText => "kernel text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Step,
    Run,
}

/// Where a multi-instruction step left the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// The step budget ran out with the program still runnable.
    Running,
    Finished,
    /// Stopped before an instruction with a breakpoint on it.
    Breakpoint,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepOutcome::Running => "running",
            StepOutcome::Finished => "finished",
            StepOutcome::Breakpoint => "stopped at breakpoint",
        };
        f.write_str(name)
    }
}

/// Append-only log of everything the simulator printed.
///
/// The scroll position follows the tail: after every append it points at the
/// end of the text, the same way a terminal keeps the newest line visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRegion {
    text: String,
    lines: usize,
    scroll_top: usize,
}

impl OutputRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` followed by a newline.
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
        self.text.push('\n');
        self.lines += text.matches('\n').count() + 1;
        self.scroll_top = self.text.len();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text appended after byte offset `cursor`. Offsets past the end give "".
    pub fn since(&self, cursor: usize) -> &str {
        self.text.get(cursor..).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }
}

/// Point-in-time view of a session, printed as JSON by the `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub state: SessionState,
    pub source: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub memory_view: MemoryView,
    pub registers: Option<String>,
    pub memory: Option<String>,
    pub output_lines: usize,
}
