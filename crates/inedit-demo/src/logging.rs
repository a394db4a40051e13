#![forbid(unsafe_code)]

//! Log file setup.
//!
//! The demo owns the terminal, so logs go to a file. The filter comes from
//! `INEDIT_LOG` using `EnvFilter` directive syntax.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "INEDIT_LOG";

/// Filter used when `INEDIT_LOG` is unset or malformed.
pub const DEFAULT_FILTER: &str = "info";

/// Install a global `fmt` subscriber appending to `path`.
///
/// # Errors
///
/// Fails if the file cannot be opened or a global subscriber is already set.
pub fn init(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(io::Error::other)
}
