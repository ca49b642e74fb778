//! CLI for ifrate: log a network interface's throughput to CSV.

mod commands;

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(name = "ifrate")]
#[command(about = "Sample a network interface's byte counters and log bytes/sec to CSV until interrupted")]
#[command(version = ifrate_core::VERSION)]
#[command(override_usage = "ifrate [OPTIONS] <OUTFILE> <INTERVAL> <INTERFACE>\n       ifrate --list-interfaces")]
pub struct Cli {
    /// CSV file to write (truncated if it exists)
    #[arg(required_unless_present = "list_interfaces")]
    outfile: Option<PathBuf>,

    /// Seconds to wait between samples (digits only, 0 = back to back)
    #[arg(required_unless_present = "list_interfaces")]
    interval: Option<String>,

    /// Interface to sample (exact, case-sensitive name)
    #[arg(required_unless_present = "list_interfaces")]
    interface: Option<String>,

    /// Also write the first row, computed against zero counters at the Unix epoch
    #[arg(long)]
    emit_first_row: bool,

    /// Stop normally after this long (e.g. "5m", "30s", "1h")
    #[arg(long)]
    duration: Option<String>,

    /// Print the interfaces the counter source can see and exit
    #[arg(long)]
    list_interfaces: bool,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            // Printing only fails if stderr/stdout is gone; the exit code still reports.
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    let result = if cli.list_interfaces {
        commands::interfaces::run()
    } else {
        commands::monitor_config(&cli).and_then(|config| commands::record::run(&config))
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if e.is_usage() {
            eprintln!("{}", Cli::command().render_usage());
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
