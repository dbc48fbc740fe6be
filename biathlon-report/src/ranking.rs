//! Report ranking
//!
//! Groups a raw event stream by competitor, aggregates each group and orders
//! the resulting reports: finishers first by total time, then everyone who
//! did not start or did not finish.

use crate::aggregator::aggregate_competitor;
use crate::config::CompetitionConfig;
use crate::format::{render_result_table, TableFormat};
use crate::types::{Anomaly, CompetitorEvent, CompetitorId, CompetitorReport};
use std::collections::BTreeMap;

/// Ranked reports plus anything odd noticed on the way
#[derive(Debug, Clone, Default)]
pub struct RaceReport {
    /// Reports in ranking order
    pub reports: Vec<CompetitorReport>,
    /// Anomalies in input order
    pub anomalies: Vec<Anomaly>,
}

impl RaceReport {
    /// Render the ranked reports as a result table
    pub fn render(&self, config: &CompetitionConfig, format: &TableFormat) -> String {
        render_result_table(&self.reports, config, format)
    }
}

/// Bucket events by competitor, each bucket sorted by time
///
/// Buckets are keyed by competitor id; events with equal times keep their
/// arrival order.
pub fn group_by_competitor(
    events: &[CompetitorEvent],
) -> BTreeMap<CompetitorId, Vec<CompetitorEvent>> {
    let mut groups: BTreeMap<CompetitorId, Vec<CompetitorEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.competitor).or_default().push(event.clone());
    }
    for events in groups.values_mut() {
        events.sort_by_key(|e| e.time);
    }
    groups
}

/// Collect input anomalies: missing competitor ids and unknown event codes
pub fn find_anomalies(events: &[CompetitorEvent]) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for event in events {
        if event.has_missing_competitor() {
            anomalies.push(Anomaly::MissingCompetitorId {
                time: event.time,
                kind: event.kind,
            });
        }
        if !event.kind.is_known() {
            anomalies.push(Anomaly::UnknownEventKind {
                code: event.kind.code(),
                competitor: event.competitor,
                time: event.time,
            });
        }
    }
    anomalies
}

/// Order reports: finishers by total time, then all incomplete reports
///
/// The sort is stable, so equal keys keep their incoming order.
pub fn rank_reports(reports: &mut [CompetitorReport]) {
    reports.sort_by(|a, b| {
        a.status
            .is_incomplete()
            .cmp(&b.status.is_incomplete())
            .then(a.total_time.cmp(&b.total_time))
    });
}

/// Aggregate and rank every competitor present in `events`
///
/// # Arguments
/// * `events` - The full event stream in arrival order
/// * `config` - Race parameters
/// * `targets_per_line` - Targets on each firing line
pub fn build_race_report(
    events: &[CompetitorEvent],
    config: &CompetitionConfig,
    targets_per_line: u32,
) -> RaceReport {
    let anomalies = find_anomalies(events);
    for anomaly in &anomalies {
        log::warn!("Input anomaly: {}", anomaly);
    }

    let mut reports: Vec<CompetitorReport> = group_by_competitor(events)
        .into_iter()
        .map(|(competitor, events)| {
            aggregate_competitor(competitor, &events, config, targets_per_line)
        })
        .collect();

    rank_reports(&mut reports);

    log::info!(
        "Ranked {} competitors ({} anomalies)",
        reports.len(),
        anomalies.len()
    );

    RaceReport { reports, anomalies }
}
