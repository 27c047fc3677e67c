//! Redirects file descriptor 1 into a pipe while native code runs.
//!
//! The simulator library prints straight to the C `stdout`. Between
//! [`StdoutCapture::begin`] and [`StdoutCapture::finish`] those bytes land in a
//! pipe drained by a reader thread, so long outputs never block the writer.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{FromRawFd, RawFd};
use std::thread::JoinHandle;

const STDOUT: RawFd = libc::STDOUT_FILENO;

fn check(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

pub struct StdoutCapture {
    saved: Option<RawFd>,
    reader: Option<JoinHandle<io::Result<Vec<u8>>>>,
}

impl StdoutCapture {
    pub fn begin() -> io::Result<Self> {
        io::stdout().flush()?;
        unsafe { libc::fflush(std::ptr::null_mut()) };

        let mut fds = [0 as RawFd; 2];
        check(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
        let [read_end, write_end] = fds;

        let saved = match check(unsafe { libc::dup(STDOUT) }) {
            Ok(saved) => saved,
            Err(e) => {
                unsafe {
                    libc::close(read_end);
                    libc::close(write_end);
                }
                return Err(e);
            }
        };
        if let Err(e) = check(unsafe { libc::dup2(write_end, STDOUT) }) {
            unsafe {
                libc::close(read_end);
                libc::close(write_end);
                libc::close(saved);
            }
            return Err(e);
        }
        // fd 1 now holds the only write end
        unsafe { libc::close(write_end) };

        let reader = std::thread::spawn(move || {
            let mut pipe = unsafe { File::from_raw_fd(read_end) };
            let mut captured = Vec::new();
            pipe.read_to_end(&mut captured)?;
            Ok(captured)
        });

        Ok(Self {
            saved: Some(saved),
            reader: Some(reader),
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };
        unsafe { libc::fflush(std::ptr::null_mut()) };
        let restored = check(unsafe { libc::dup2(saved, STDOUT) });
        unsafe { libc::close(saved) };
        restored.map(|_| ())
    }

    /// Puts stdout back and returns everything written in between.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        self.restore()?;
        match self.reader.take() {
            Some(reader) => reader
                .join()
                .map_err(|_| io::Error::other("stdout capture reader panicked"))?,
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for StdoutCapture {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("Could not restore stdout: {}", e);
        }
    }
}

/// Splits captured bytes into complete lines.
///
/// A trailing fragment without a newline is kept in `pending` and prefixed to
/// the next chunk.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(bytes));

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete.lines().map(str::to_string).collect()
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // fd 1 is process-wide
    static FD_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_line_buffer_holds_partial_lines() {
        let mut lines = LineBuffer::new();

        assert!(lines.push(b"The Fibonacci ").is_empty());
        assert_eq!(lines.pending(), "The Fibonacci ");

        assert_eq!(
            lines.push(b"numbers are:\n1 1 2\n3"),
            vec!["The Fibonacci numbers are:", "1 1 2"]
        );
        assert_eq!(lines.pending(), "3");

        assert_eq!(lines.push(b" 5\n\n"), vec!["3 5", ""]);
        assert_eq!(lines.pending(), "");
    }

    #[test]
    fn test_captures_native_writes() {
        let _guard = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let capture = StdoutCapture::begin().unwrap();
        let message = b"captured-by-stdout-capture\n";
        let written = unsafe { libc::write(STDOUT, message.as_ptr().cast(), message.len()) };
        let captured = capture.finish().unwrap();

        assert_eq!(written, message.len() as isize);
        // the test harness may print on fd 1 concurrently
        let text = String::from_utf8_lossy(&captured);
        assert!(text.contains("captured-by-stdout-capture"));
    }

    #[test]
    fn test_captures_more_than_a_pipe_buffer() {
        let _guard = FD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let capture = StdoutCapture::begin().unwrap();
        let chunk = [b'x'; 4096];
        for _ in 0..64 {
            let written = unsafe { libc::write(STDOUT, chunk.as_ptr().cast(), chunk.len()) };
            assert_eq!(written, chunk.len() as isize);
        }
        let captured = capture.finish().unwrap();

        assert!(captured.iter().filter(|&&b| b == b'x').count() >= 64 * 4096);
    }
}
