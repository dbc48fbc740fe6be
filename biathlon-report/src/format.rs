//! Result-table formatting
//!
//! Renders competitor reports into fixed-column text lines:
//!
//! ```text
//! [00:02:10.000] 1 [{00:01:00.000, 58.333}, {00:01:10.000, 50.000}] [{,}, {,}] 2/10
//! ```
//!
//! Lap and penalty-loop columns are always padded to the configured slot
//! count with `{,}`.

use crate::config::CompetitionConfig;
use crate::types::{CompetitorReport, CompetitorStatus, LapSplit, ReportError, Result};
use chrono::TimeDelta;

/// Default duration template: hours, minutes, seconds, milliseconds
pub const DEFAULT_DURATION_TEMPLATE: &str = "%02d:%02d:%02d.%03d";

/// Number of integer slots a duration template must contain
const TEMPLATE_SLOTS: usize = 4;

/// Widest padding a slot may ask for
const MAX_SLOT_WIDTH: usize = u16::MAX as usize;

/// One piece of a parsed duration template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Integer slot with minimum width and zero padding flag
    Slot { width: usize, zero_pad: bool },
}

/// A printf-style template with four integer slots (`%d`, `%Nd`, `%0Nd`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationTemplate {
    segments: Vec<Segment>,
}

impl DurationTemplate {
    /// Parse a template such as `%02d:%02d:%02d.%03d`. `%%` is a literal percent.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: String| ReportError::InvalidTemplate {
            template: pattern.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }

            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
                digits.push(d);
                chars.next();
            }
            match chars.next() {
                Some('d') => {}
                Some(other) => {
                    return Err(invalid(format!("unsupported verb %{}{}", digits, other)))
                }
                None => return Err(invalid("dangling %".to_string())),
            }

            let zero_pad = digits.starts_with('0');
            let width = if digits.is_empty() {
                0
            } else {
                digits
                    .parse::<usize>()
                    .map_err(|e| invalid(format!("bad width {:?}: {}", digits, e)))?
            };
            if width > MAX_SLOT_WIDTH {
                return Err(invalid(format!("width {} exceeds {}", width, MAX_SLOT_WIDTH)));
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Slot { width, zero_pad });
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let slots = segments
            .iter()
            .filter(|s| matches!(s, Segment::Slot { .. }))
            .count();
        if slots != TEMPLATE_SLOTS {
            return Err(invalid(format!(
                "expected {} integer slots, found {}",
                TEMPLATE_SLOTS, slots
            )));
        }

        Ok(Self { segments })
    }

    /// Render a duration as hours, minutes, seconds and milliseconds
    ///
    /// Components are truncated, never rounded. Hours are not wrapped.
    pub fn render(&self, duration: TimeDelta) -> String {
        let millis = duration.num_milliseconds();
        let values = [
            millis / 3_600_000,
            (millis / 60_000) % 60,
            (millis / 1000) % 60,
            millis % 1000,
        ];

        let mut out = String::new();
        let mut values = values.iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot { width, zero_pad } => {
                    let value = values.next().copied().unwrap_or_default();
                    let rendered = if *zero_pad {
                        format!("{:0width$}", value, width = *width)
                    } else {
                        format!("{:width$}", value, width = *width)
                    };
                    out.push_str(&rendered);
                }
            }
        }
        out
    }
}

impl Default for DurationTemplate {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Slot {
                    width: 2,
                    zero_pad: true,
                },
                Segment::Literal(":".to_string()),
                Segment::Slot {
                    width: 2,
                    zero_pad: true,
                },
                Segment::Literal(":".to_string()),
                Segment::Slot {
                    width: 2,
                    zero_pad: true,
                },
                Segment::Literal(".".to_string()),
                Segment::Slot {
                    width: 3,
                    zero_pad: true,
                },
            ],
        }
    }
}

/// Everything the result table needs besides the reports
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub template: DurationTemplate,
    /// Label shown instead of a time for competitors who never started
    pub not_started: String,
    /// Label shown instead of a time for competitors who did not finish
    pub not_finished: String,
}

impl TableFormat {
    pub fn new(template: DurationTemplate) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }

    /// Builder method: override the status labels
    pub fn with_labels(
        mut self,
        not_started: impl Into<String>,
        not_finished: impl Into<String>,
    ) -> Self {
        self.not_started = not_started.into();
        self.not_finished = not_finished.into();
        self
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            template: DurationTemplate::default(),
            not_started: CompetitorStatus::NotStarted.to_string(),
            not_finished: CompetitorStatus::NotFinished.to_string(),
        }
    }
}

/// Render one report as a result-table line (without trailing newline)
pub fn format_report(
    report: &CompetitorReport,
    config: &CompetitionConfig,
    format: &TableFormat,
) -> String {
    let headline = match report.status {
        CompetitorStatus::NotStarted => format.not_started.clone(),
        CompetitorStatus::NotFinished => format.not_finished.clone(),
        CompetitorStatus::Started | CompetitorStatus::Finished => {
            format.template.render(report.total_time)
        }
    };

    format!(
        "[{}] {} {} {} {}/{}",
        headline,
        report.competitor,
        format_lap_list(&report.laps, config.laps as usize, &format.template),
        format_lap_list(
            &report.penalty_laps,
            config.firing_lines as usize,
            &format.template
        ),
        report.hits,
        report.shots
    )
}

/// Render exactly `slots` lap entries, padding missing ones with `{,}`
pub fn format_lap_list(laps: &[LapSplit], slots: usize, template: &DurationTemplate) -> String {
    let entries: Vec<String> = (0..slots)
        .map(|i| match laps.get(i) {
            Some(lap) => format!("{{{}, {:.3}}}", template.render(lap.elapsed), lap.speed),
            None => "{,}".to_string(),
        })
        .collect();

    format!("[{}]", entries.join(", "))
}

/// Render every report in the given order, one newline-terminated line each
pub fn render_result_table(
    reports: &[CompetitorReport],
    config: &CompetitionConfig,
    format: &TableFormat,
) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format_report(report, config, format));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(secs: i64, speed: f64) -> LapSplit {
        LapSplit {
            elapsed: TimeDelta::seconds(secs),
            speed,
        }
    }

    #[test]
    fn test_default_template_matches_parsed() {
        let parsed = DurationTemplate::parse(DEFAULT_DURATION_TEMPLATE).unwrap();
        assert_eq!(parsed, DurationTemplate::default());
    }

    #[test]
    fn test_render_duration() {
        let template = DurationTemplate::default();
        let d = TimeDelta::milliseconds(3_723_045);
        assert_eq!(template.render(d), "01:02:03.045");
        assert_eq!(template.render(TimeDelta::zero()), "00:00:00.000");
        assert_eq!(template.render(TimeDelta::hours(100)), "100:00:00.000");
    }

    #[test]
    fn test_truncates_sub_millisecond() {
        let template = DurationTemplate::default();
        let d = TimeDelta::microseconds(1_999);
        assert_eq!(template.render(d), "00:00:00.001");
    }

    #[test]
    fn test_custom_template() {
        let template = DurationTemplate::parse("%dh %dm %ds %3dms (100%%)").unwrap();
        let d = TimeDelta::milliseconds(3_723_004);
        assert_eq!(template.render(d), "1h 2m 3s   4ms (100%)");
    }

    #[test]
    fn test_invalid_templates() {
        assert!(DurationTemplate::parse("%02d:%02d:%02d").is_err());
        assert!(DurationTemplate::parse("%02d:%02d:%02d.%03f").is_err());
        assert!(DurationTemplate::parse("%02d:%02d:%02d.%").is_err());
        assert!(DurationTemplate::parse("%d%d%d%d%d").is_err());
    }

    #[test]
    fn test_oversized_width_is_rejected() {
        assert!(matches!(
            DurationTemplate::parse("%70000d:%d:%d.%d"),
            Err(ReportError::InvalidTemplate { .. })
        ));
        assert!(DurationTemplate::parse("%099999999999999999999d:%d:%d.%d").is_err());

        let widest = format!("%0{}d:%d:%d.%d", u16::MAX);
        let template = DurationTemplate::parse(&widest).unwrap();
        assert_eq!(
            template.render(TimeDelta::seconds(1)).len(),
            u16::MAX as usize + ":0:1.0".len()
        );
    }

    #[test]
    fn test_lap_list_padding() {
        let template = DurationTemplate::default();
        let laps = vec![split(60, 3500.0 / 60.0)];
        assert_eq!(
            format_lap_list(&laps, 2, &template),
            "[{00:01:00.000, 58.333}, {,}]"
        );
        assert_eq!(format_lap_list(&[], 0, &template), "[]");
        assert_eq!(format_lap_list(&[], 2, &template), "[{,}, {,}]");
    }

    #[test]
    fn test_format_finished_report() {
        let config = CompetitionConfig::new(2, 3500, 150, 2);
        let report = CompetitorReport {
            competitor: 1,
            status: CompetitorStatus::Finished,
            total_time: TimeDelta::seconds(130),
            laps: vec![split(60, 3500.0 / 60.0), split(70, 50.0)],
            penalty_laps: vec![split(30, 5.0)],
            hits: 2,
            shots: 10,
        };

        assert_eq!(
            format_report(&report, &config, &TableFormat::default()),
            "[00:02:10.000] 1 [{00:01:00.000, 58.333}, {00:01:10.000, 50.000}] [{00:00:30.000, 5.000}, {,}] 2/10"
        );
    }

    #[test]
    fn test_format_status_labels() {
        let config = CompetitionConfig::new(2, 3500, 150, 2);
        let report = CompetitorReport {
            competitor: 4,
            status: CompetitorStatus::NotStarted,
            total_time: TimeDelta::zero(),
            laps: Vec::new(),
            penalty_laps: Vec::new(),
            hits: 0,
            shots: 10,
        };

        assert_eq!(
            format_report(&report, &config, &TableFormat::default()),
            "[NotStarted] 4 [{,}, {,}] [{,}, {,}] 0/10"
        );

        let format = TableFormat::default().with_labels("DNS", "DNF");
        assert!(format_report(&report, &config, &format).starts_with("[DNS] 4 "));
    }

    #[test]
    fn test_render_is_idempotent() {
        let config = CompetitionConfig::new(1, 3500, 150, 1);
        let reports = vec![CompetitorReport {
            competitor: 2,
            status: CompetitorStatus::NotFinished,
            total_time: TimeDelta::zero(),
            laps: Vec::new(),
            penalty_laps: Vec::new(),
            hits: 3,
            shots: 5,
        }];

        let first = render_result_table(&reports, &config, &TableFormat::default());
        let second = render_result_table(&reports, &config, &TableFormat::default());
        assert_eq!(first, second);
        assert_eq!(first, "[NotFinished] 2 [{,}] [{,}] 3/5\n");
    }
}
