//! Competition configuration
//!
//! Race parameters loaded from a JSON document. The config is immutable after
//! loading and shared read-only by every competitor aggregation.

use crate::types::{ReportError, Result, Timestamp};
use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::Deserialize;
use std::path::Path;

/// Default format of event timestamps and of the scheduled start
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Default format of the start interval
pub const DEFAULT_DELTA_FORMAT: &str = "%H:%M:%S";

/// Race parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionConfig {
    /// Number of main laps a competitor must complete
    pub laps: u32,
    /// Length of one main lap in meters
    pub lap_len: u32,
    /// Length of one penalty loop in meters
    pub penalty_len: u32,
    /// Number of firing lines on the course
    pub firing_lines: u32,
    /// Scheduled start of the race
    pub start: Timestamp,
    /// Interval between consecutive starts
    pub start_delta: TimeDelta,
}

/// On-disk shape of the competition config
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompetitionConfig {
    laps: u32,
    lap_len: u32,
    penalty_len: u32,
    firing_lines: u32,
    start: String,
    start_delta: String,
}

impl CompetitionConfig {
    /// Create a config starting at midnight with no start interval
    pub fn new(laps: u32, lap_len: u32, penalty_len: u32, firing_lines: u32) -> Self {
        Self {
            laps,
            lap_len,
            penalty_len,
            firing_lines,
            start: NaiveTime::MIN,
            start_delta: TimeDelta::zero(),
        }
    }

    /// Builder method: set the scheduled start
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = start;
        self
    }

    /// Builder method: set the start interval
    pub fn with_start_delta(mut self, delta: TimeDelta) -> Self {
        self.start_delta = delta;
        self
    }

    /// Parse a JSON config document
    ///
    /// `start` is parsed with `time_format`, `startDelta` with `delta_format`
    /// and read as a duration since midnight.
    pub fn from_json_str(json: &str, time_format: &str, delta_format: &str) -> Result<Self> {
        let raw: RawCompetitionConfig = serde_json::from_str(json)?;

        let start = parse_time(&raw.start, time_format)?;
        let delta_time = parse_time(&raw.start_delta, delta_format)?;

        let config = Self {
            laps: raw.laps,
            lap_len: raw.lap_len,
            penalty_len: raw.penalty_len,
            firing_lines: raw.firing_lines,
            start,
            start_delta: since_midnight(delta_time),
        };
        config.validate()?;

        Ok(config)
    }

    /// Check the value ranges a race needs
    pub fn validate(&self) -> Result<()> {
        if self.laps == 0 {
            return Err(ReportError::InvalidConfig(
                "laps must be at least 1".to_string(),
            ));
        }
        if self.lap_len == 0 {
            return Err(ReportError::InvalidConfig(
                "lapLen must be positive".to_string(),
            ));
        }
        if self.penalty_len == 0 {
            return Err(ReportError::InvalidConfig(
                "penaltyLen must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a competition config from a JSON file
pub fn load_competition_config(
    path: &Path,
    time_format: &str,
    delta_format: &str,
) -> Result<CompetitionConfig> {
    log::info!("Loading competition config: {:?}", path);

    let content = std::fs::read_to_string(path)?;
    let config = CompetitionConfig::from_json_str(&content, time_format, delta_format)?;

    log::debug!(
        "Competition config: {} laps x {}m, penalty loop {}m, {} firing lines",
        config.laps,
        config.lap_len,
        config.penalty_len,
        config.firing_lines
    );
    Ok(config)
}

pub(crate) fn parse_time(value: &str, format: &str) -> Result<Timestamp> {
    NaiveTime::parse_from_str(value, format).map_err(|source| ReportError::InvalidTimestamp {
        value: value.to_string(),
        source,
    })
}

fn since_midnight(time: NaiveTime) -> TimeDelta {
    let seconds = time.num_seconds_from_midnight() as i64;
    let millis = (time.nanosecond() / 1_000_000) as i64;
    TimeDelta::milliseconds(seconds * 1000 + millis)
}
