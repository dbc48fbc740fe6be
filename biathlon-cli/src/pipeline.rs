//! Report pipeline
//!
//! Runs the four stages in order: load the competition config, parse the
//! event log, write the narrated log, write the result table. Each output is
//! rendered in memory and written once, truncating any previous file.

use crate::config::AppConfig;
use biathlon_report::{
    build_race_report, load_competition_config, parse_events_file, render_event_log,
    sorted_by_time, CompetitionConfig, CompetitorEvent, NarrationTable, ReportError, TableFormat,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadConfig,
    ParseEvents,
    WriteEventLog,
    WriteResultTable,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::LoadConfig => write!(f, "load competition config"),
            Stage::ParseEvents => write!(f, "parse events"),
            Stage::WriteEventLog => write!(f, "write event log"),
            Stage::WriteResultTable => write!(f, "write result table"),
        }
    }
}

/// A failed stage and the file it was working on
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to {stage} ({path:?})")]
    StageFailed {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: ReportError,
    },

    #[error("Skipped result table: no competition config")]
    MissingConfig,
}

/// What a run produced
#[derive(Debug, Default)]
pub struct RunSummary {
    pub events: usize,
    pub competitors: usize,
    pub anomalies: usize,
    pub failures: Vec<PipelineError>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Pipeline<'a> {
    settings: &'a AppConfig,
    narration: NarrationTable,
    format: TableFormat,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            settings,
            narration: settings.narration_table()?,
            format: settings.table_format()?,
        })
    }

    /// Run every stage
    ///
    /// With `fail_fast` the first failure is returned as an error. Otherwise
    /// failures are logged, collected in the summary, and later stages run
    /// with whatever data exists.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let paths = &self.settings.paths;
        let formats = &self.settings.format;
        let mut summary = RunSummary::default();

        let config = self.stage(
            &mut summary,
            load_competition_config(&paths.config, &formats.time_format, &formats.delta_format)
                .map_err(|source| PipelineError::StageFailed {
                    stage: Stage::LoadConfig,
                    path: paths.config.clone(),
                    source,
                }),
        )?;

        let events = self
            .stage(
                &mut summary,
                parse_events_file(&paths.events, &formats.time_format).map_err(|source| {
                    PipelineError::StageFailed {
                        stage: Stage::ParseEvents,
                        path: paths.events.clone(),
                        source,
                    }
                }),
            )?
            .unwrap_or_default();
        summary.events = events.len();

        let outcome = self.write_event_log(&events);
        self.stage(&mut summary, outcome)?;

        match config {
            Some(config) => {
                let outcome = self.write_result_table(&events, &config, &mut summary);
                self.stage(&mut summary, outcome)?;
            }
            None => {
                self.stage::<()>(&mut summary, Err(PipelineError::MissingConfig))?;
            }
        }

        Ok(summary)
    }

    /// Apply the failure policy to one stage's outcome
    fn stage<T>(
        &self,
        summary: &mut RunSummary,
        outcome: Result<T, PipelineError>,
    ) -> Result<Option<T>, PipelineError> {
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.settings.run.fail_fast => Err(e),
            Err(e) => {
                log::error!("{}", describe(&e));
                summary.failures.push(e);
                Ok(None)
            }
        }
    }

    fn write_event_log(&self, events: &[CompetitorEvent]) -> Result<(), PipelineError> {
        let time_format = &self.settings.format.time_format;
        let path = &self.settings.paths.output_log;
        let rendered = if self.settings.format.chronological_log {
            render_event_log(&sorted_by_time(events), &self.narration, time_format)
        } else {
            render_event_log(events, &self.narration, time_format)
        };
        let content = rendered.map_err(|source| PipelineError::StageFailed {
            stage: Stage::WriteEventLog,
            path: path.clone(),
            source,
        })?;

        write_output(path, &content, Stage::WriteEventLog)
    }

    fn write_result_table(
        &self,
        events: &[CompetitorEvent],
        config: &CompetitionConfig,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let race = build_race_report(
            events,
            config,
            self.settings.race.targets_per_firing_line,
        );
        summary.competitors = race.reports.len();
        summary.anomalies = race.anomalies.len();

        let content = race.render(config, &self.format);
        write_output(&self.settings.paths.result_table, &content, Stage::WriteResultTable)
    }
}

fn write_output(path: &Path, content: &str, stage: Stage) -> Result<(), PipelineError> {
    log::debug!("Writing {} bytes to {:?}", content.len(), path);
    fs::write(path, content).map_err(|e| PipelineError::StageFailed {
        stage,
        path: path.to_path_buf(),
        source: ReportError::IoError(e),
    })
}

/// Error message including its source chain
fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
