use crate::domain::model::OutputRegion;
use std::sync::{Arc, Mutex, MutexGuard};

/// The simulator's print channels.
///
/// `print` appends to the shared output region; `print_err` only reaches the
/// console log. Clones share the same region.
#[derive(Debug, Clone, Default)]
pub struct Printer {
    region: Arc<Mutex<OutputRegion>>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, OutputRegion> {
        // a panic mid-append leaves a complete String behind; keep using it
        self.region.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn print(&self, text: &str) {
        tracing::debug!(target: "spim_shell::output", "{}", text);
        self.lock().append(text);
    }

    pub fn print_err(&self, text: &str) {
        tracing::error!(target: "spim_shell::simulator", "{}", text);
    }

    pub fn with_region<T>(&self, f: impl FnOnce(&OutputRegion) -> T) -> T {
        f(&*self.lock())
    }

    /// Copy of the output region as it is now.
    pub fn snapshot(&self) -> OutputRegion {
        self.lock().clone()
    }
}
