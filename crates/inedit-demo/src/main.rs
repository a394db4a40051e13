#![forbid(unsafe_code)]

//! inedit demo binary entry point.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use inedit_demo::app::RoomSettings;
use inedit_demo::cli;
use inedit_demo::logging;
use inedit_demo::store::{RoomRecord, RoomStore};
use inedit_runtime::{Program, ProgramConfig};

fn main() {
    let opts = cli::Opts::parse();

    if let Some(path) = &opts.log_file
        && let Err(e) = logging::init(path)
    {
        eprintln!("Failed to open log file {}: {e}", path.display());
        process::exit(1);
    }

    let store = RoomStore::new(
        RoomRecord {
            name: opts.name.clone(),
            greeting: opts.greeting.clone(),
        },
        Duration::from_millis(opts.latency_ms),
        opts.max_name_len,
    );
    tracing::info!(
        latency_ms = opts.latency_ms,
        max_name_len = opts.max_name_len,
        "starting room settings demo"
    );

    let model = match RoomSettings::new(Arc::new(store)) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Invalid field setup: {e}");
            process::exit(1);
        }
    };

    let config = ProgramConfig::default().with_mouse(opts.mouse);
    // The program (and its terminal session) is dropped before exiting.
    let result = Program::new(model, config).and_then(|mut program| program.run());
    if let Err(e) = result {
        eprintln!("Runtime error: {e}");
        process::exit(1);
    }
}
