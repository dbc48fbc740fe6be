//! Event log parser
//!
//! Each non-blank line has the shape
//! `[HH:MM:SS.mmm] <eventCode> <competitorId> [extra...]`.
//! A single malformed line aborts the whole parse.

use crate::config::parse_time;
use crate::types::{CompetitorEvent, EventKind, ReportError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse one log line. Blank lines yield `None`.
pub fn parse_event_line(line: &str, time_format: &str) -> Result<Option<CompetitorEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(ReportError::MalformedLine {
            line: 0,
            reason: format!("expected at least 3 fields, found {}", fields.len()),
        });
    }

    let time_str = fields[0].trim_matches(|c| c == '[' || c == ']');
    let time = parse_time(time_str, time_format)?;
    let code = parse_int(fields[1])?;
    let competitor = parse_int(fields[2])?;
    let extra = fields[3..].join(" ");

    Ok(Some(CompetitorEvent {
        time,
        kind: EventKind::from_code(code),
        competitor,
        extra,
    }))
}

/// Parse every line of `reader` in arrival order
pub fn parse_events<R: BufRead>(reader: R, time_format: &str) -> Result<Vec<CompetitorEvent>> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;

        let event = parse_event_line(&line, time_format).map_err(|e| match e {
            ReportError::MalformedLine { reason, .. } => ReportError::MalformedLine {
                line: line_no,
                reason,
            },
            ReportError::IoError(e) => ReportError::IoError(e),
            other => ReportError::MalformedLine {
                line: line_no,
                reason: other.to_string(),
            },
        })?;

        if let Some(event) = event {
            log::trace!("Line {}: {:?}", line_no, event);
            events.push(event);
        }
    }

    Ok(events)
}

/// Parse an event log file
pub fn parse_events_file(path: &Path, time_format: &str) -> Result<Vec<CompetitorEvent>> {
    log::info!("Parsing event log: {:?}", path);

    let file = File::open(path)?;
    let events = parse_events(BufReader::new(file), time_format)?;

    log::info!("Parsed {} events from {:?}", events.len(), path);
    Ok(events)
}

fn parse_int(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|source| ReportError::InvalidInteger {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TIME_FORMAT;
    use chrono::NaiveTime;

    #[test]
    fn test_parse_line_with_extra() {
        let event = parse_event_line("[09:15:00.841] 2 7 09:30:00.000", DEFAULT_TIME_FORMAT)
            .unwrap()
            .unwrap();

        assert_eq!(
            event.time,
            NaiveTime::from_hms_milli_opt(9, 15, 0, 841).unwrap()
        );
        assert_eq!(event.kind, EventKind::StartTimeDrawn);
        assert_eq!(event.competitor, 7);
        assert_eq!(event.extra, "09:30:00.000");
    }

    #[test]
    fn test_extra_fields_joined() {
        let event = parse_event_line(
            "[09:59:03.872] 11 7   Lost in   the forest",
            DEFAULT_TIME_FORMAT,
        )
        .unwrap()
        .unwrap();

        assert_eq!(event.kind, EventKind::CannotContinue);
        assert_eq!(event.extra, "Lost in the forest");
    }

    #[test]
    fn test_blank_line() {
        assert!(parse_event_line("   ", DEFAULT_TIME_FORMAT).unwrap().is_none());
    }

    #[test]
    fn test_unknown_code_is_not_an_error() {
        let event = parse_event_line("[10:00:00.000] 42 3", DEFAULT_TIME_FORMAT)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, EventKind::Unknown(42));
        assert_eq!(event.extra, "");
    }

    #[test]
    fn test_bad_lines() {
        assert!(parse_event_line("[invalid line without timestamp]", DEFAULT_TIME_FORMAT).is_err());
        assert!(matches!(
            parse_event_line("[10:00:00.000] 4", DEFAULT_TIME_FORMAT),
            Err(ReportError::MalformedLine { .. })
        ));
        assert!(matches!(
            parse_event_line("[10:00:00.000] four 1", DEFAULT_TIME_FORMAT),
            Err(ReportError::InvalidInteger { .. })
        ));
        assert!(matches!(
            parse_event_line("[10:00] 4 1", DEFAULT_TIME_FORMAT),
            Err(ReportError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_parse_events_skips_blank_lines() {
        let input = "[09:05:59.867] 1 1\n\n[09:15:00.841] 2 1 09:30:00.000\n";
        let events = parse_events(input.as_bytes(), DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Registered);
        assert_eq!(events[1].extra, "09:30:00.000");
    }

    #[test]
    fn test_parse_events_reports_line_number() {
        let input = "[09:05:59.867] 1 1\n\n[09:15:00.841] x 1\n[09:16:00.000] 1 2\n";
        match parse_events(input.as_bytes(), DEFAULT_TIME_FORMAT) {
            Err(ReportError::MalformedLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed line error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        let events = parse_events("".as_bytes(), DEFAULT_TIME_FORMAT).unwrap();
        assert!(events.is_empty());
    }
}
