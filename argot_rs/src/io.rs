//! IO handles threaded from the [`crate::App`] into every [`crate::Context`].
//!
//! Handles are cheap to clone (`Arc<Mutex<..>>`), so a handler may move one
//! into background work. [`Io::capture`] swaps the process streams for
//! in-memory buffers, which is how the test-suite observes output.

use std::fmt::Display;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, line-oriented input handle.
#[derive(Clone)]
pub struct SharedReader(Arc<Mutex<Box<dyn BufRead + Send>>>);

impl SharedReader {
    pub fn new(reader: impl BufRead + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(reader))))
    }

    /// Read one line, without its trailing newline.
    ///
    /// Blocks the calling thread until a line (or EOF) is available.
    /// Returns `Ok(None)` on EOF.
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = lock(&self.0).read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Shared output handle. Implements [`Write`], locking per call.
#[derive(Clone)]
pub struct SharedWriter(Arc<Mutex<Box<dyn Write + Send>>>);

impl SharedWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    /// Write a line. Write errors (e.g. a closed pipe) are dropped.
    pub fn line(&self, text: impl Display) {
        let mut guard = lock(&self.0);
        let _ = writeln!(guard, "{}", text);
        let _ = guard.flush();
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.0).flush()
    }
}

/// In-memory buffer exposed by [`Io::capture`].
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read side of a captured [`Io`].
#[derive(Clone, Default)]
pub struct Captured {
    out: Buffer,
    err: Buffer,
}

impl Captured {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&lock(&self.out.0)).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&lock(&self.err.0)).into_owned()
    }
}

/// The stdin/stdout/stderr triple plus the TTY verdict taken at creation.
#[derive(Clone)]
pub struct Io {
    pub stdin: SharedReader,
    pub stdout: SharedWriter,
    pub stderr: SharedWriter,
    terminal: bool,
}

impl Io {
    /// Process streams. Interactive iff both stdin and stdout are terminals.
    pub fn std() -> Self {
        let terminal = io::stdin().is_terminal() && io::stdout().is_terminal();
        Self {
            stdin: SharedReader::new(BufReader::new(io::stdin())),
            stdout: SharedWriter::new(io::stdout()),
            stderr: SharedWriter::new(io::stderr()),
            terminal,
        }
    }

    /// In-memory streams: `input` is served as stdin, output is captured.
    pub fn capture(input: &str) -> (Self, Captured) {
        let captured = Captured::default();
        let io = Self {
            stdin: SharedReader::new(io::Cursor::new(input.as_bytes().to_vec())),
            stdout: SharedWriter::new(captured.out.clone()),
            stderr: SharedWriter::new(captured.err.clone()),
            terminal: false,
        };
        (io, captured)
    }

    /// Whether stdin and stdout were both terminals when the handles were made.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

impl Default for Io {
    fn default() -> Self {
        Self::std()
    }
}

impl std::fmt::Debug for Io {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Io")
            .field("terminal", &self.terminal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_roundtrip() {
        let (io, captured) = Io::capture("first\nsecond\r\n");
        io.stdout.line("hello");
        io.stderr.line("oops");

        assert_eq!(captured.stdout(), "hello\n");
        assert_eq!(captured.stderr(), "oops\n");
        assert_eq!(io.stdin.read_line().unwrap().as_deref(), Some("first"));
        assert_eq!(io.stdin.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(io.stdin.read_line().unwrap(), None);
        assert!(!io.is_terminal());
    }

    #[test]
    fn test_clones_share_buffers() {
        let (io, captured) = Io::capture("");
        let mut writer = io.clone().stdout;
        write!(writer, "a").unwrap();
        io.stdout.line("b");
        assert_eq!(captured.stdout(), "ab\n");
    }
}
