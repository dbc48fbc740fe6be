//! Core types for the biathlon report library
//!
//! This module defines the event records read from a competition log and the
//! per-competitor reports derived from them. Events are immutable once parsed;
//! reports are built once per competitor and only consumed afterwards.

use chrono::{NaiveTime, TimeDelta};
use std::fmt;

/// Wall-clock instant of an event (time of day, millisecond precision)
pub type Timestamp = NaiveTime;

/// Competitor identifier. `0` marks an event whose competitor field was missing.
pub type CompetitorId = i64;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while reading inputs or rendering reports
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Malformed event at line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid integer field {value:?}: {source}")]
    InvalidInteger {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Failed to decode competition config: {0}")]
    ConfigParseError(#[from] serde_json::Error),

    #[error("Invalid competition config: {0}")]
    InvalidConfig(String),

    #[error("Invalid duration template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The kinds of competition happenings an event line can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Registered,
    StartTimeDrawn,
    OnStartLine,
    Started,
    OnFiringRange,
    TargetHit,
    LeftFiringRange,
    PenaltyLapEntered,
    PenaltyLapLeft,
    LapCompleted,
    CannotContinue,
    /// Any code outside 1..=11. Inert for aggregation, still narrated.
    Unknown(i64),
}

impl EventKind {
    /// All known kinds in code order
    pub const KNOWN: [EventKind; 11] = [
        EventKind::Registered,
        EventKind::StartTimeDrawn,
        EventKind::OnStartLine,
        EventKind::Started,
        EventKind::OnFiringRange,
        EventKind::TargetHit,
        EventKind::LeftFiringRange,
        EventKind::PenaltyLapEntered,
        EventKind::PenaltyLapLeft,
        EventKind::LapCompleted,
        EventKind::CannotContinue,
    ];

    /// Map a numeric event code from the log to its kind
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => EventKind::Registered,
            2 => EventKind::StartTimeDrawn,
            3 => EventKind::OnStartLine,
            4 => EventKind::Started,
            5 => EventKind::OnFiringRange,
            6 => EventKind::TargetHit,
            7 => EventKind::LeftFiringRange,
            8 => EventKind::PenaltyLapEntered,
            9 => EventKind::PenaltyLapLeft,
            10 => EventKind::LapCompleted,
            11 => EventKind::CannotContinue,
            other => EventKind::Unknown(other),
        }
    }

    /// Numeric code as written in the log
    pub fn code(&self) -> i64 {
        match self {
            EventKind::Registered => 1,
            EventKind::StartTimeDrawn => 2,
            EventKind::OnStartLine => 3,
            EventKind::Started => 4,
            EventKind::OnFiringRange => 5,
            EventKind::TargetHit => 6,
            EventKind::LeftFiringRange => 7,
            EventKind::PenaltyLapEntered => 8,
            EventKind::PenaltyLapLeft => 9,
            EventKind::LapCompleted => 10,
            EventKind::CannotContinue => 11,
            EventKind::Unknown(code) => *code,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Unknown(_))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single parsed line of the competition log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitorEvent {
    /// When the event happened
    pub time: Timestamp,
    /// What happened
    pub kind: EventKind,
    /// Who it happened to (0 if missing)
    pub competitor: CompetitorId,
    /// Kind-dependent payload: draw time, firing line, target number or comment
    pub extra: String,
}

impl CompetitorEvent {
    pub fn new(time: Timestamp, kind: EventKind, competitor: CompetitorId) -> Self {
        Self {
            time,
            kind,
            competitor,
            extra: String::new(),
        }
    }

    /// Builder method: attach the extra parameter
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// True if the competitor field was missing or zero
    pub fn has_missing_competitor(&self) -> bool {
        self.competitor == 0
    }
}

/// Return a copy of `events` sorted by time. Equal times keep arrival order.
pub fn sorted_by_time(events: &[CompetitorEvent]) -> Vec<CompetitorEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|e| e.time);
    sorted
}

/// Elapsed time and average speed over one main lap or penalty loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapSplit {
    pub elapsed: TimeDelta,
    /// Meters per second
    pub speed: f64,
}

/// Final standing of a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompetitorStatus {
    /// No start event was seen
    NotStarted,
    /// Started but not (yet) classified. Never present in a finished report.
    Started,
    /// Withdrew, or never completed the required laps
    NotFinished,
    /// Completed every required lap
    Finished,
}

impl CompetitorStatus {
    /// NotStarted and NotFinished both rank after every finisher
    pub fn is_incomplete(&self) -> bool {
        !matches!(self, CompetitorStatus::Finished)
    }
}

impl fmt::Display for CompetitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompetitorStatus::NotStarted => write!(f, "NotStarted"),
            CompetitorStatus::Started => write!(f, "Started"),
            CompetitorStatus::NotFinished => write!(f, "NotFinished"),
            CompetitorStatus::Finished => write!(f, "Finished"),
        }
    }
}

/// Aggregated result for one competitor
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorReport {
    pub competitor: CompetitorId,
    pub status: CompetitorStatus,
    /// Finish minus start. Zero unless `status` is `Finished`.
    pub total_time: TimeDelta,
    pub laps: Vec<LapSplit>,
    pub penalty_laps: Vec<LapSplit>,
    pub hits: u32,
    pub shots: u32,
}

/// Something unusual in the input that did not stop processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// Event line carried competitor id 0
    MissingCompetitorId { time: Timestamp, kind: EventKind },
    /// Event code outside the known range
    UnknownEventKind {
        code: i64,
        competitor: CompetitorId,
        time: Timestamp,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::MissingCompetitorId { time, kind } => {
                write!(f, "event {} at {} has no competitor id", kind, time)
            }
            Anomaly::UnknownEventKind {
                code,
                competitor,
                time,
            } => write!(
                f,
                "unknown event code {} for competitor {} at {}",
                code, competitor, time
            ),
        }
    }
}
