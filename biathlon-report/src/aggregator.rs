//! Competitor aggregation
//!
//! Folds one competitor's time-ordered events into a [`CompetitorReport`]:
//! status, total time, per-lap and per-penalty-loop splits, hits and shots.

use crate::config::CompetitionConfig;
use crate::types::{
    CompetitorEvent, CompetitorId, CompetitorReport, CompetitorStatus, EventKind, LapSplit,
    Timestamp,
};
use chrono::TimeDelta;

/// Build the report for one competitor
///
/// `events` must be sorted ascending by time. The fold is a single pass; event
/// kinds other than start, target hit, penalty entry/exit, lap completion and
/// withdrawal leave the state untouched.
///
/// # Arguments
/// * `competitor` - Competitor the events belong to
/// * `events` - That competitor's events, time-sorted
/// * `config` - Race parameters
/// * `targets_per_line` - Targets on each firing line, used for the shot count
pub fn aggregate_competitor(
    competitor: CompetitorId,
    events: &[CompetitorEvent],
    config: &CompetitionConfig,
    targets_per_line: u32,
) -> CompetitorReport {
    let mut status = CompetitorStatus::NotStarted;
    let mut withdrawn = false;
    let mut start_time: Option<Timestamp> = None;
    let mut finish_time: Option<Timestamp> = None;
    let mut lap_start: Option<Timestamp> = None;
    let mut penalty_start: Option<Timestamp> = None;
    let mut completed_laps: u32 = 0;
    let mut hits: u32 = 0;
    let mut lap_speed = 0.0;
    let mut penalty_speed = 0.0;
    let mut laps = Vec::new();
    let mut penalty_laps = Vec::new();

    for event in events {
        match event.kind {
            EventKind::Started => {
                start_time = Some(event.time);
                lap_start = Some(event.time);
                if !withdrawn {
                    status = CompetitorStatus::Started;
                }
            }
            EventKind::TargetHit => {
                hits += 1;
            }
            EventKind::PenaltyLapEntered => {
                penalty_start = Some(event.time);
            }
            EventKind::PenaltyLapLeft => {
                if penalty_start.is_none() {
                    log::warn!(
                        "Competitor {} left the penalty laps at {} without entering them",
                        competitor,
                        event.time
                    );
                }

                if penalty_laps.len() < config.firing_lines as usize {
                    let split = measure_split(
                        penalty_start,
                        event.time,
                        config.penalty_len,
                        &mut penalty_speed,
                    );
                    penalty_laps.push(split);
                } else {
                    log::warn!(
                        "Competitor {} has more penalty loops than firing lines ({}), ignoring loop ending at {}",
                        competitor,
                        config.firing_lines,
                        event.time
                    );
                }
                penalty_start = Some(event.time);
            }
            EventKind::LapCompleted => {
                completed_laps += 1;
                if completed_laps > config.laps {
                    log::warn!(
                        "Competitor {} completed lap {} of {}, ignoring",
                        competitor,
                        completed_laps,
                        config.laps
                    );
                    continue;
                }
                if completed_laps == config.laps {
                    finish_time = Some(event.time);
                }

                if lap_start.is_none() {
                    log::warn!(
                        "Competitor {} completed a lap at {} without starting",
                        competitor,
                        event.time
                    );
                }

                let split = measure_split(lap_start, event.time, config.lap_len, &mut lap_speed);
                laps.push(split);
                lap_start = Some(event.time);
            }
            EventKind::CannotContinue => {
                withdrawn = true;
                status = CompetitorStatus::NotFinished;
            }
            EventKind::Registered
            | EventKind::StartTimeDrawn
            | EventKind::OnStartLine
            | EventKind::OnFiringRange
            | EventKind::LeftFiringRange
            | EventKind::Unknown(_) => {}
        }
    }

    if status == CompetitorStatus::Started {
        status = if finish_time.is_some() {
            CompetitorStatus::Finished
        } else {
            CompetitorStatus::NotFinished
        };
    }

    let total_time = match (status, start_time, finish_time) {
        (CompetitorStatus::Finished, Some(start), Some(finish)) => {
            finish.signed_duration_since(start)
        }
        _ => TimeDelta::zero(),
    };

    log::debug!(
        "Competitor {}: {} after {} events, {} laps, {} penalty loops, {} hits",
        competitor,
        status,
        events.len(),
        laps.len(),
        penalty_laps.len(),
        hits
    );

    CompetitorReport {
        competitor,
        status,
        total_time,
        laps,
        penalty_laps,
        hits,
        shots: config.firing_lines.saturating_mul(targets_per_line),
    }
}

/// Time one loop and update the carried speed
///
/// Speed is only recomputed when the elapsed time is strictly positive;
/// otherwise the previous loop's speed (initially zero) is reported again.
/// A missing start marker counts as zero elapsed time.
fn measure_split(
    start: Option<Timestamp>,
    end: Timestamp,
    length: u32,
    carried_speed: &mut f64,
) -> LapSplit {
    let elapsed = start
        .map(|start| end.signed_duration_since(start))
        .unwrap_or_else(TimeDelta::zero);

    let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
    if seconds > 0.0 {
        *carried_speed = length as f64 / seconds;
    }

    LapSplit {
        elapsed,
        speed: *carried_speed,
    }
}
