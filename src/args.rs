use log::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Run,
    Screenshot,
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub mode: Mode,
    pub config_path: PathBuf,
    pub log_level: Option<LevelFilter>,
    pub debug: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, PartialEq)]
pub enum Parsed {
    Run(Args),
    Help,
    Version,
}

pub const DEFAULT_CONFIG: &str = "config.json";

pub fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Parsed, String> {
    let mut mode = Mode::Run;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut log_level = None;
    let mut debug = false;
    let mut timeout_secs = None;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Ok(Parsed::Help);
        } else if arg == "--version" || arg == "-v" {
            return Ok(Parsed::Version);
        } else if arg == "--debug" {
            debug = true;
        } else if arg == "--screenshot" || arg == "-s" {
            mode = Mode::Screenshot;
        } else if let Some(val) = arg.strip_prefix("--config=") {
            if val.is_empty() {
                return Err("Empty --config path".to_string());
            }
            config_path = PathBuf::from(val);
        } else if let Some(val) = arg.strip_prefix("--timeout=") {
            let secs = val
                .parse::<u64>()
                .map_err(|_| format!("Invalid timeout value: {val}"))?;
            timeout_secs = Some(secs);
        } else if let Some(val) = arg.strip_prefix("--log-level=") {
            let level = val
                .parse::<LevelFilter>()
                .map_err(|_| format!("Invalid log level: {val}"))?;
            log_level = Some(level);
        } else {
            return Err(format!("Unknown argument: {arg}"));
        }
    }

    Ok(Parsed::Run(Args {
        mode,
        config_path,
        log_level,
        debug,
        timeout_secs,
    }))
}

impl Args {
    /// `--log-level` wins over `--debug`; neither means "use RUST_LOG or info".
    pub fn level_override(&self) -> Option<LevelFilter> {
        self.log_level.or(self.debug.then_some(LevelFilter::Debug))
    }
}

pub fn print_help() {
    println!("💎 Trade Clicker");
    println!();
    println!("USAGE:");
    println!("    trade-clicker [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    (no flags)          Run the automation loop headless until Ctrl-C");
    println!("    --config=PATH       Config file (default: {DEFAULT_CONFIG})");
    println!("    --screenshot, -s    Capture the configured monitor to cli-screenshot.png");
    println!("    --timeout=N         Auto-exit after N seconds");
    println!("    --log-level=LEVEL   error, warn, info, debug or trace");
    println!("    --debug             Shorthand for --log-level=debug");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    trade-clicker --config=trades.json");
    println!("    trade-clicker --screenshot");
    println!("    trade-clicker --debug --timeout=60");
}
