#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args by hand to keep the binary lean. Every option can also be set
//! through an `INEDIT_DEMO_*` environment variable; explicit flags win.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
inedit demo: room settings edited in place

USAGE:
    inedit-demo [OPTIONS]

OPTIONS:
    --latency-ms=N       Simulated store latency per write (default: 600)
    --name=TEXT          Initial room name (default: \"Room 1\")
    --greeting=TEXT      Initial lobby greeting (default: \"Welcome in!\")
    --max-name-len=N     Longest room name the store accepts (default: 24)
    --log-file=PATH      Write logs to PATH (filter with INEDIT_LOG)
    --no-mouse           Disable mouse event capture
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    Tab / Shift-Tab      Move between fields (commits the field being edited)
    Enter / click        Start editing; Enter again saves
    Esc                  Discard the draft
    q / Ctrl+C           Quit (q only while nothing is being edited)

ENVIRONMENT VARIABLES:
    INEDIT_DEMO_LATENCY_MS    Override --latency-ms
    INEDIT_DEMO_NAME          Override --name
    INEDIT_DEMO_GREETING      Override --greeting
    INEDIT_DEMO_MAX_NAME_LEN  Override --max-name-len
    INEDIT_DEMO_LOG_FILE      Override --log-file
    INEDIT_LOG                Log filter, e.g. \"debug\" or \"inedit=trace\"";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Milliseconds each store write takes.
    pub latency_ms: u64,
    /// Initial room name.
    pub name: String,
    /// Initial lobby greeting.
    pub greeting: String,
    /// Longest accepted room name, in characters.
    pub max_name_len: usize,
    /// Log destination; no logging when unset.
    pub log_file: Option<PathBuf>,
    /// Whether mouse events are enabled.
    pub mouse: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            latency_ms: 600,
            name: "Room 1".into(),
            greeting: "Welcome in!".into(),
            max_name_len: 24,
            log_file: None,
            mouse: true,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Run the demo.
    Run(Opts),
    /// Print help and exit.
    Help,
    /// Print the version and exit.
    Version,
}

impl Opts {
    /// Parse the process arguments and environment.
    ///
    /// Prints help or version and exits when asked to; exits with status 1 on
    /// a bad argument.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1), |name| env::var(name).ok()) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("inedit-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with `var` as the environment lookup.
    pub fn parse_from<I, V>(args: I, var: V) -> Result<Parsed, String>
    where
        I: IntoIterator<Item = String>,
        V: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first; flags below override it.
        if let Some(val) = var("INEDIT_DEMO_LATENCY_MS")
            && let Ok(n) = val.parse()
        {
            opts.latency_ms = n;
        }
        if let Some(val) = var("INEDIT_DEMO_NAME") {
            opts.name = val;
        }
        if let Some(val) = var("INEDIT_DEMO_GREETING") {
            opts.greeting = val;
        }
        if let Some(val) = var("INEDIT_DEMO_MAX_NAME_LEN")
            && let Ok(n) = val.parse()
        {
            opts.max_name_len = n;
        }
        if let Some(val) = var("INEDIT_DEMO_LOG_FILE")
            && !val.is_empty()
        {
            opts.log_file = Some(PathBuf::from(val));
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--no-mouse" => opts.mouse = false,
                other => {
                    if let Some(val) = other.strip_prefix("--latency-ms=") {
                        opts.latency_ms = val
                            .parse()
                            .map_err(|_| format!("Invalid --latency-ms value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--name=") {
                        opts.name = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--greeting=") {
                        opts.greeting = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--max-name-len=") {
                        opts.max_name_len = val
                            .parse()
                            .map_err(|_| format!("Invalid --max-name-len value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Parsed::Run(opts))
    }
}
