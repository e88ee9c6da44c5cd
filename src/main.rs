use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process;

use update_census::analyzer::{LogAnalyzer, RunOptions};
use update_census::config::get_config;
use update_census::logging;

#[derive(Parser)]
#[command(name = "update-census")]
#[command(about = "Estimate daily active installations from update-check API access logs")]
#[command(version)]
struct Cli {
    /// Access log to analyze (one JSON record per line, timestamp-ordered)
    log_file: PathBuf,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Days before an update check its installation counts as active
    #[arg(long)]
    before: Option<u32>,

    /// Days after an update check its installation counts as active
    #[arg(long)]
    after: Option<u32>,

    /// Maximum backwards timestamp jitter in milliseconds
    #[arg(long)]
    tolerance_ms: Option<i64>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging();

    let config = get_config();
    let options = RunOptions {
        days_before: cli.before.unwrap_or(config.window.days_before),
        days_after: cli.after.unwrap_or(config.window.days_after),
        tolerance_ms: cli.tolerance_ms.unwrap_or(config.ordering.tolerance_ms),
        json_output: cli.json,
        color: config.output.color && !cli.no_color,
    };

    let mut analyzer = LogAnalyzer::new(options);
    match analyzer.analyze_file(&cli.log_file) {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, cli.json),
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
