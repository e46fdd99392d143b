use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Output channel a record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Destination for serialized log lines. `line` never contains a newline.
pub trait Sink: Send + Sync {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()>;
}

/// Writes to the process's standard output and standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdSink;

impl Sink for StdSink {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()> {
        match stream {
            Stream::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()
            }
            Stream::Stderr => {
                let mut err = io::stderr().lock();
                writeln!(err, "{line}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub stream: Stream,
    pub line: String,
}

/// In-memory sink. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<CapturedLine>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn lines(&self) -> Vec<CapturedLine> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn lines_on(&self, stream: Stream) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|c| c.stream == stream)
            .map(|c| c.line)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}

impl Sink for MemorySink {
    fn write_line(&self, stream: Stream, line: &str) -> io::Result<()> {
        let mut guard = self
            .lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink lock poisoned"))?;
        guard.push(CapturedLine {
            stream,
            line: line.to_string(),
        });
        Ok(())
    }
}
