//! Leveled logging.
//!
//! The [`Logger`] routes each message to exactly one rendering chosen by
//! severity and drops anything below a runtime floor. Lines at
//! [`Severity::Error`] and above go to standard error, the rest to standard
//! output.
//!
//! ```
//! use std::sync::Arc;
//! use kms_ship::logging::{LevelFormatter, Logger, MemorySink, OutputStream, Palette, Severity};
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::new(Severity::Info, LevelFormatter::standard(&Palette::plain()), sink.clone());
//! logger.debug("not shown");
//! logger.error("shown");
//! assert_eq!(sink.stream(OutputStream::Stderr), vec!["ERROR: shown"]);
//! ```

/// `log` crate backend forwarding into a [`Logger`]
pub mod bridge;

/// Format rules, palettes and rule lookup
pub mod format;

/// Logger and output sinks
pub mod logger;

/// Severity levels
pub mod severity;

pub use format::{FormatRule, LevelFormatter, LogEvent, Palette};
pub use logger::{ConsoleSink, LogSink, Logger, MemorySink, OutputStream};
pub use severity::Severity;
