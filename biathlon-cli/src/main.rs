//! Biathlon Report CLI Application
//!
//! Command-line interface for the biathlon report generator.
//! It uses the biathlon-report library and adds:
//! - Settings file and command-line overrides
//! - Logging setup
//! - The file pipeline (competition config, event log, narrated log, result table)

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod pipeline;

use config::AppConfig;
use pipeline::Pipeline;

/// Biathlon Report - Narrate a competition event log and rank competitors
#[derive(Parser, Debug)]
#[command(name = "biathlon-cli")]
#[command(about = "Narrate biathlon competition events and build the result table", long_about = None)]
#[command(version)]
struct Args {
    /// Path to settings file (settings.toml)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Path to the competition config (JSON)
    #[arg(short, long, value_name = "FILE", env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Path to the event log
    #[arg(short, long, value_name = "FILE", env = "EVENTS_PATH")]
    events: Option<PathBuf>,

    /// Output file for the narrated event log
    #[arg(short, long, value_name = "FILE", env = "OUTPUT_FILE_PATH")]
    output: Option<PathBuf>,

    /// Output file for the result table
    #[arg(short, long, value_name = "FILE", env = "RESULT_TABLE_PATH")]
    result_table: Option<PathBuf>,

    /// Number of targets on each firing line
    #[arg(long, value_name = "COUNT", env = "TARGETS_IN_FIRE_LINE")]
    targets: Option<u32>,

    /// strftime format of event timestamps and the scheduled start
    #[arg(long, value_name = "FORMAT", env = "TIME_FORMAT")]
    time_format: Option<String>,

    /// strftime format of the start interval
    #[arg(long, value_name = "FORMAT", env = "TIME_DURATION_FORMAT")]
    delta_format: Option<String>,

    /// Four-slot printf template for durations in the result table
    #[arg(long, value_name = "TEMPLATE", env = "REPORT_TABLE_TIME_FORMAT")]
    duration_template: Option<String>,

    /// Stop at the first failed stage
    #[arg(long)]
    fail_fast: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Biathlon Report CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using report library v{}", biathlon_report::VERSION);

    let settings = resolve_settings(&args)?;
    settings.validate()?;
    log::debug!("Settings: {:?}", settings);

    let summary = Pipeline::new(&settings)?.run()?;

    log::info!(
        "{} events, {} competitors ranked, {} anomalies",
        summary.events,
        summary.competitors,
        summary.anomalies
    );

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        log::warn!("{} stage(s) failed", summary.failures.len());
        Ok(ExitCode::FAILURE)
    }
}

/// Settings file (or defaults) with command-line and environment overrides applied
fn resolve_settings(args: &Args) -> Result<AppConfig> {
    let mut settings = match &args.settings {
        Some(path) => {
            log::info!("Loading settings from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(path) = &args.config {
        settings.paths.config = path.clone();
    }
    if let Some(path) = &args.events {
        settings.paths.events = path.clone();
    }
    if let Some(path) = &args.output {
        settings.paths.output_log = path.clone();
    }
    if let Some(path) = &args.result_table {
        settings.paths.result_table = path.clone();
    }
    if let Some(targets) = args.targets {
        settings.race.targets_per_firing_line = targets;
    }
    if let Some(format) = &args.time_format {
        settings.format.time_format = format.clone();
    }
    if let Some(format) = &args.delta_format {
        settings.format.delta_format = format.clone();
    }
    if let Some(template) = &args.duration_template {
        settings.format.duration_template = template.clone();
    }
    if args.fail_fast {
        settings.run.fail_fast = true;
    }

    Ok(settings)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
