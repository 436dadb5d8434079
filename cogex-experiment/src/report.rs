//! Destinations for completed-run reports.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use cogex_core::RunReport;

use crate::error::ReportError;

/// Receives exactly one report per completed run. Aborted runs are never
/// reported.
pub trait ResultSink {
    fn on_result(&mut self, report: &RunReport) -> Result<(), ReportError>;
}

/// In-memory sink; clones share the collected reports.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    reports: Arc<Mutex<Vec<RunReport>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<RunReport> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for CollectingSink {
    fn on_result(&mut self, report: &RunReport) -> Result<(), ReportError> {
        self.reports
            .lock()
            .map_err(|_| ReportError::Rejected("collector lock poisoned".into()))?
            .push(report.clone());
        Ok(())
    }
}

/// Appends one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for JsonLinesSink {
    fn on_result(&mut self, report: &RunReport) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_vec(report)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn on_result(&mut self, report: &RunReport) -> Result<(), ReportError> {
        tracing::info!(
            game = %report.game,
            trials = report.trials.len(),
            summary = ?report.summary,
            "run completed"
        );
        Ok(())
    }
}

/// Forwards each report to every inner sink; the first failure is returned
/// after all sinks have been tried.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ResultSink for FanOutSink {
    fn on_result(&mut self, report: &RunReport) -> Result<(), ReportError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.on_result(report) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogex_core::{GameKey, RunSummary};

    fn simon_report(level: u32) -> RunReport {
        RunReport {
            game: GameKey::Simon,
            summary: RunSummary::Simon {
                level,
                sequence_length: level as usize + 1,
            },
            trials: Vec::new(),
            started_at_ns: 0,
            finished_at_ns: 1,
        }
    }

    #[test]
    fn json_lines_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let mut sink = JsonLinesSink::new(&path);
        sink.on_result(&simon_report(3)).unwrap();
        sink.on_result(&simon_report(5)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<RunReport> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines, vec![simon_report(3), simon_report(5)]);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let a = CollectingSink::new();
        let b = CollectingSink::new();
        let mut sink = FanOutSink::new().with(a.clone()).with(LogSink).with(b.clone());
        sink.on_result(&simon_report(1)).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.reports(), vec![simon_report(1)]);
    }
}
