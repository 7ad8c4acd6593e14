//! Process-wide handling of failures no job can own.
//!
//! A panic anywhere in the execution unit, including inside a spawned task, is logged with its
//! location and a backtrace and then ends the process with [`FATAL_EXIT_CODE`]. The host treats
//! the unit as dead and starts a fresh one for later files.

use std::backtrace::Backtrace;
use std::fmt::Display;
use std::sync::Once;
use tracing::error;

pub const FATAL_EXIT_CODE: i32 = 1;

static INSTALL: Once = Once::new();

/// Install the fatal panic hook. Later calls are no-ops.
pub fn install_fatal_handler() {
    INSTALL.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown".to_string());
            let backtrace = Backtrace::force_capture();
            error!(%message, %location, %backtrace, "uncaught panic in coverage worker");
            std::process::exit(FATAL_EXIT_CODE);
        }));
    });
}

/// Log `err` and end the process. For failures that cannot be attributed to a file.
pub fn fail_fast(err: impl Display) -> ! {
    error!(error = %err, "fatal worker error");
    std::process::exit(FATAL_EXIT_CODE)
}
