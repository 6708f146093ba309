use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use super::format::{LevelFormatter, LogEvent, Palette};
use super::severity::Severity;

/// Destination stream for a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn for_level(level: Severity) -> Self {
        if level.is_error_stream() {
            OutputStream::Stderr
        } else {
            OutputStream::Stdout
        }
    }
}

/// Line-oriented output target.
///
/// Each call writes one complete line, so concurrent callers never produce
/// interleaved partial lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, stream: OutputStream, line: &str);
}

/// Writes to the process's standard output and standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_line(&self, stream: OutputStream, line: &str) {
        // Write failures such as a closed pipe are ignored
        let _ = match stream {
            OutputStream::Stdout => writeln!(io::stdout().lock(), "{}", line),
            OutputStream::Stderr => writeln!(io::stderr().lock(), "{}", line),
        };
    }
}

/// In-memory sink that records every line, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(OutputStream, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines in write order.
    pub fn lines(&self) -> Vec<(OutputStream, String)> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Captured lines written to one stream.
    pub fn stream(&self, stream: OutputStream) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().map(|lines| lines.is_empty()).unwrap_or(true)
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, stream: OutputStream, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((stream, line.to_string()));
        }
    }
}

/// Leveled logger with a runtime severity floor.
///
/// Constructed once and shared as `Arc<Logger>`. The floor is the only
/// mutable state and is stored atomically.
pub struct Logger {
    minimum: AtomicU8,
    formatter: LevelFormatter,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(minimum: Severity, formatter: LevelFormatter, sink: Arc<dyn LogSink>) -> Self {
        Logger {
            minimum: AtomicU8::new(minimum as u8),
            formatter,
            sink,
        }
    }

    /// Logger writing the standard rule table to the console.
    pub fn console(minimum: Severity, palette: &Palette) -> Self {
        Logger::new(minimum, LevelFormatter::standard(palette), Arc::new(ConsoleSink))
    }

    /// Set the severity floor.
    pub fn configure(&self, minimum: Severity) {
        self.minimum.store(minimum as u8, Ordering::Relaxed);
    }

    pub fn minimum(&self) -> Severity {
        Severity::from_u8(self.minimum.load(Ordering::Relaxed))
    }

    pub fn enabled(&self, level: Severity) -> bool {
        level >= self.minimum()
    }

    /// Render and write one line, unless `level` is below the floor.
    pub fn emit(&self, level: Severity, message: impl AsRef<str>) {
        if !self.enabled(level) {
            return;
        }
        let event = LogEvent::new(level, message.as_ref());
        let line = self.formatter.format(&event);
        self.sink.write_line(OutputStream::for_level(level), &line);
    }

    pub fn trace(&self, message: impl AsRef<str>) {
        self.emit(Severity::Trace, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(Severity::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Severity::Info, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Severity::Error, message);
    }

    pub fn critical(&self, message: impl AsRef<str>) {
        self.emit(Severity::Critical, message);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("minimum", &self.minimum())
            .field("rules", &self.formatter.rules().len())
            .finish()
    }
}
