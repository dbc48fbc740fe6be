//! Event narration
//!
//! Turns each event into a human-readable sentence for the audit log. The
//! sentence templates live in an immutable [`NarrationTable`] handed to the
//! narrator; templates may use `{competitor}`, `{extra}` and `{code}`.

use crate::types::{CompetitorEvent, EventKind, ReportError, Result, Timestamp};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveTime;
use std::collections::BTreeMap;
use std::fmt::Write;

const DEFAULT_TEMPLATES: [(EventKind, &str); 11] = [
    (EventKind::Registered, "The competitor({competitor}) registered"),
    (
        EventKind::StartTimeDrawn,
        "The start time for the competitor({competitor}) was set by a draw to {extra}",
    ),
    (EventKind::OnStartLine, "The competitor({competitor}) is on the start line"),
    (EventKind::Started, "The competitor({competitor}) has started"),
    (
        EventKind::OnFiringRange,
        "The competitor({competitor}) is on the firing range({extra})",
    ),
    (
        EventKind::TargetHit,
        "The target({extra}) has been hit by competitor({competitor})",
    ),
    (EventKind::LeftFiringRange, "The competitor({competitor}) left the firing range"),
    (EventKind::PenaltyLapEntered, "The competitor({competitor}) entered the penalty laps"),
    (EventKind::PenaltyLapLeft, "The competitor({competitor}) left the penalty laps"),
    (EventKind::LapCompleted, "The competitor({competitor}) ended the main lap"),
    (
        EventKind::CannotContinue,
        "The competitor({competitor}) can`t continue: {extra}",
    ),
];

const DEFAULT_UNKNOWN_TEMPLATE: &str = "Unknown event ID ({code}) for competitor({competitor})";

/// Sentence templates keyed by event kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationTable {
    templates: BTreeMap<EventKind, String>,
    unknown: String,
}

impl NarrationTable {
    /// Builder method: replace the template for a known event kind
    pub fn with_template(mut self, kind: EventKind, template: impl Into<String>) -> Self {
        if kind.is_known() {
            self.templates.insert(kind, template.into());
        } else {
            log::warn!("Ignoring narration template for unknown event code {}", kind);
        }
        self
    }

    /// Builder method: replace the sentence used for unknown event codes
    pub fn with_unknown_template(mut self, template: impl Into<String>) -> Self {
        self.unknown = template.into();
        self
    }

    /// Template used for `kind`
    pub fn template(&self, kind: EventKind) -> &str {
        self.templates
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(&self.unknown)
    }

    /// Sentence for one event, without the timestamp prefix
    pub fn sentence(&self, event: &CompetitorEvent) -> String {
        self.template(event.kind)
            .replace("{code}", &event.kind.code().to_string())
            .replace("{competitor}", &event.competitor.to_string())
            .replace("{extra}", &event.extra)
    }
}

impl Default for NarrationTable {
    fn default() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(kind, template)| (*kind, template.to_string()))
                .collect(),
            unknown: DEFAULT_UNKNOWN_TEMPLATE.to_string(),
        }
    }
}

/// Check that a strftime-style format can render a time of day
///
/// Date and offset specifiers such as `%Y` or `%z` parse fine but cannot be
/// rendered from a bare time, so the format is trial-rendered as well.
pub fn check_time_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid_time_format(format));
    }
    render_time(NaiveTime::MIN, format).map(|_| ())
}

/// `[<time>] <sentence>` for one event
pub fn narrate(
    event: &CompetitorEvent,
    table: &NarrationTable,
    time_format: &str,
) -> Result<String> {
    Ok(format!(
        "[{}] {}",
        render_time(event.time, time_format)?,
        table.sentence(event)
    ))
}

/// Narrate every event in the given order, one newline-terminated line each
pub fn render_event_log(
    events: &[CompetitorEvent],
    table: &NarrationTable,
    time_format: &str,
) -> Result<String> {
    let mut out = String::new();
    for event in events {
        out.push_str(&narrate(event, table, time_format)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_time(time: Timestamp, format: &str) -> Result<String> {
    let mut rendered = String::new();
    write!(rendered, "{}", time.format(format)).map_err(|_| invalid_time_format(format))?;
    Ok(rendered)
}

fn invalid_time_format(format: &str) -> ReportError {
    ReportError::InvalidTemplate {
        template: format.to_string(),
        reason: "not a valid time-of-day format".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TIME_FORMAT;

    fn event(kind: EventKind, extra: &str) -> CompetitorEvent {
        let time = NaiveTime::from_hms_milli_opt(9, 49, 33, 123).unwrap();
        CompetitorEvent::new(time, kind, 7).with_extra(extra)
    }

    fn narrated(kind: EventKind, extra: &str) -> String {
        narrate(&event(kind, extra), &NarrationTable::default(), DEFAULT_TIME_FORMAT).unwrap()
    }

    #[test]
    fn test_default_sentences() {
        assert_eq!(
            narrated(EventKind::Registered, ""),
            "[09:49:33.123] The competitor(7) registered"
        );
        assert_eq!(
            narrated(EventKind::StartTimeDrawn, "09:30:00.000"),
            "[09:49:33.123] The start time for the competitor(7) was set by a draw to 09:30:00.000"
        );
        assert_eq!(
            narrated(EventKind::OnFiringRange, "1"),
            "[09:49:33.123] The competitor(7) is on the firing range(1)"
        );
        assert_eq!(
            narrated(EventKind::TargetHit, "4"),
            "[09:49:33.123] The target(4) has been hit by competitor(7)"
        );
        assert_eq!(
            narrated(EventKind::CannotContinue, "Lost in the forest"),
            "[09:49:33.123] The competitor(7) can`t continue: Lost in the forest"
        );
    }

    #[test]
    fn test_every_known_kind_has_a_template() {
        let table = NarrationTable::default();
        for kind in EventKind::KNOWN {
            assert_ne!(table.template(kind), DEFAULT_UNKNOWN_TEMPLATE);
        }
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(
            narrated(EventKind::Unknown(15), ""),
            "[09:49:33.123] Unknown event ID (15) for competitor(7)"
        );
    }

    #[test]
    fn test_template_override() {
        let table = NarrationTable::default()
            .with_template(EventKind::Started, "#{competitor} is off")
            .with_template(EventKind::Unknown(20), "ignored");

        assert_eq!(table.sentence(&event(EventKind::Started, "")), "#7 is off");
        assert_eq!(
            table.template(EventKind::Unknown(20)),
            DEFAULT_UNKNOWN_TEMPLATE
        );
    }

    #[test]
    fn test_extra_is_not_expanded() {
        let table = NarrationTable::default();
        let sentence = table.sentence(&event(EventKind::CannotContinue, "{competitor}"));
        assert_eq!(sentence, "The competitor(7) can`t continue: {competitor}");
    }

    #[test]
    fn test_event_log_keeps_input_order() {
        let table = NarrationTable::default();
        let events = vec![event(EventKind::Started, ""), event(EventKind::Registered, "")];
        let log = render_event_log(&events, &table, "%H:%M:%S").unwrap();
        assert_eq!(
            log,
            "[09:49:33] The competitor(7) has started\n[09:49:33] The competitor(7) registered\n"
        );
    }

    #[test]
    fn test_check_time_format() {
        assert!(check_time_format(DEFAULT_TIME_FORMAT).is_ok());
        assert!(check_time_format("%H:%M:%Q").is_err());
    }

    #[test]
    fn test_date_specifier_is_rejected() {
        let format = "%H:%M:%S%.3f %Y";
        assert!(matches!(
            check_time_format(format),
            Err(ReportError::InvalidTemplate { .. })
        ));

        let table = NarrationTable::default();
        let events = vec![event(EventKind::Started, "")];
        assert!(matches!(
            narrate(&events[0], &table, format),
            Err(ReportError::InvalidTemplate { .. })
        ));
        assert!(render_event_log(&events, &table, "%z").is_err());
    }
}
