//! Biathlon Report Library
//!
//! A stateless library that turns a log of timestamped biathlon competition
//! events into a narrated event log and a ranked results table.
//!
//! # Architecture
//!
//! - Parses event lines into [`CompetitorEvent`] records
//! - Loads race parameters into a [`CompetitionConfig`]
//! - Folds each competitor's events into a [`CompetitorReport`]
//! - Ranks reports and renders them as fixed-column text
//! - Narrates events through an immutable [`NarrationTable`]
//!
//! File paths, application settings and logging setup belong to the
//! application layer (biathlon-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use biathlon_report::{
//!     build_race_report, load_competition_config, parse_events_file, TableFormat,
//!     DEFAULT_DELTA_FORMAT, DEFAULT_TIME_FORMAT,
//! };
//! use std::path::Path;
//!
//! let config = load_competition_config(
//!     Path::new("config.json"),
//!     DEFAULT_TIME_FORMAT,
//!     DEFAULT_DELTA_FORMAT,
//! )
//! .unwrap();
//! let events = parse_events_file(Path::new("events"), DEFAULT_TIME_FORMAT).unwrap();
//!
//! let race = build_race_report(&events, &config, 5);
//! print!("{}", race.render(&config, &TableFormat::default()));
//! ```

// Public modules
pub mod aggregator;
pub mod config;
pub mod format;
pub mod narrator;
pub mod parser;
pub mod ranking;
pub mod types;

// Re-export main types for convenience
pub use aggregator::aggregate_competitor;
pub use config::{
    load_competition_config, CompetitionConfig, DEFAULT_DELTA_FORMAT, DEFAULT_TIME_FORMAT,
};
pub use format::{
    format_report, render_result_table, DurationTemplate, TableFormat, DEFAULT_DURATION_TEMPLATE,
};
pub use narrator::{check_time_format, narrate, render_event_log, NarrationTable};
pub use parser::{parse_event_line, parse_events, parse_events_file};
pub use ranking::{build_race_report, group_by_competitor, rank_reports, RaceReport};
pub use types::{
    sorted_by_time, Anomaly, CompetitorEvent, CompetitorId, CompetitorReport, CompetitorStatus,
    EventKind, LapSplit, ReportError, Result, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
