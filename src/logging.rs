//! Helper functions for the logging backend.

use flexi_logger::{self, Duplicate, Logger};
use log::Level::Warn;

use crate::error::{Error, Result};

/// Creates a logging backend.
///
/// The level is read from `RUST_LOG`, falling back to `info`, or to `debug` when `trace` is set.
/// Logs are written to stdout. Errors are also duplicated to stderr.
///
/// Logs can be written via log::{error!, warn!, info!, debug!, trace!}
pub fn init_logging(trace: bool) -> Result<()> {
    let spec = if trace { "debug, symreg=trace" } else { "info" };
    Logger::try_with_env_or_str(spec)
        .map_err(|e| Error::Logger(e.to_string()))?
        .format(flexi_logger::colored_opt_format)
        .log_to_stdout()
        .duplicate_to_stderr(Duplicate::Error)
        .start()
        .map_err(|e| Error::Logger(e.to_string()))?;
    Ok(())
}

/// Creates a logging backend for use in testing.
///
/// By default all logs with Warn or higher are printed.
pub fn init_test_logging() {
    if !log::log_enabled!(Warn) {
        // Another test may have installed the logger first.
        if let Ok(logger) = Logger::try_with_env_or_str("warn") {
            let _ = logger.format(flexi_logger::colored_opt_format).start();
        }
    }
}
