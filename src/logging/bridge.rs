//! `log` facade bridge.
//!
//! Routes records emitted through the `log` macros (by this crate's client
//! helpers and by dependencies such as rusoto) into the explicit [`Logger`],
//! so every line shares one renderer and one severity floor.

use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use super::logger::Logger;
use super::severity::Severity;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `log::Log` implementation forwarding into a shared [`Logger`].
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        LogBridge { logger }
    }

    /// Dependencies are only heard from at warning and above.
    fn accepts(&self, target: &str, level: Severity) -> bool {
        let own = target == CRATE_TARGET || target.starts_with(&format!("{}::", CRATE_TARGET));
        (own || level >= Severity::Warning) && self.logger.enabled(level)
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.accepts(metadata.target(), Severity::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let level = Severity::from(record.level());
        if self.accepts(record.target(), level) {
            self.logger.emit(level, record.args().to_string());
        }
    }

    fn flush(&self) {}
}

/// Install the bridge as the process-wide `log` backend. Only the first call
/// succeeds.
pub fn install(logger: Arc<Logger>) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
