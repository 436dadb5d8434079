//! The entry battery: four abbreviated games, run one after another, reduced
//! to a composite score.

use cogex_core::RunReport;
use cogex_timing::Timer;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::composite::{self, BatteryResult, CompositeScore};
use crate::config::{EngineConfig, GridConfig, NBackConfig, StroopConfig};
use crate::driver::{DriveOutcome, Rig, drive};
use crate::games::{MemoryGridGame, NBackGame, ReactionGame, StroopGame};
use crate::participant::Participant;
use crate::session::{Controller, Session};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryReport {
    pub results: BatteryResult,
    pub score: CompositeScore,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn stage<T: Timer<Timestamp = u64>>(
    name: &str,
    session: &mut dyn Controller,
    rig: &mut Rig<'_, T>,
    participant: &mut dyn Participant,
    timeout_ms: u64,
    warnings: &mut Vec<String>,
) -> Option<RunReport> {
    match drive(session, rig, participant, timeout_ms) {
        DriveOutcome::Completed(report) => Some(report),
        other => {
            warn!(stage = name, outcome = %other, "battery stage produced no result");
            warnings.push(format!("{name}: {other}"));
            None
        }
    }
}

pub fn run_battery<T: Timer<Timestamp = u64>>(
    config: &EngineConfig,
    rig: &mut Rig<'_, T>,
    participant: &mut dyn Participant,
) -> BatteryReport {
    let b = &config.battery;
    let timeout = b.stage_timeout_ms;
    let mut warnings = Vec::new();
    let mut results = BatteryResult::default();

    let mut reaction = Session::new(ReactionGame::new(config.reaction.clone()));
    let mut attempts = 0;
    while attempts < b.reaction_max_attempts && reaction.game().latencies_ms().len() < b.reaction_trials {
        attempts += 1;
        if stage("reaction", &mut reaction, rig, participant, timeout, &mut warnings).is_none() {
            break;
        }
    }
    let latencies = reaction.game().latencies_ms();
    if !latencies.is_empty() {
        results.reaction_ms_avg = Some(latencies.iter().sum::<u64>() as f64 / latencies.len() as f64);
    }
    info!(attempts, valid = latencies.len(), avg_ms = ?results.reaction_ms_avg, "battery: reaction done");

    let mut stroop = Session::new(StroopGame::new(StroopConfig {
        trials: b.stroop_trials,
        ..config.stroop.clone()
    }));
    results.stroop_acc = stage("stroop", &mut stroop, rig, participant, timeout, &mut warnings)
        .and_then(|r| r.summary.accuracy_pct())
        .map(f64::from);
    info!(accuracy = ?results.stroop_acc, "battery: stroop done");

    let mut nback = Session::new(NBackGame::new(NBackConfig {
        max_stimuli: Some(b.nback_stimuli),
        ..config.nback.clone()
    }));
    results.nback_acc = stage("nback", &mut nback, rig, participant, timeout, &mut warnings)
        .and_then(|r| r.summary.accuracy_pct())
        .map(f64::from);
    info!(accuracy = ?results.nback_acc, "battery: n-back done");

    let mut grid = Session::new(MemoryGridGame::new(GridConfig {
        max_level: Some(b.memory_max_level),
        ..config.grid.clone()
    }));
    results.memory_level = stage("memory", &mut grid, rig, participant, timeout, &mut warnings)
        .and_then(|r| r.summary.level());
    info!(level = ?results.memory_level, "battery: memory grid done");

    let score = composite::score(&results);
    info!(composite = score.composite, level = %score.level, "battery complete");
    BatteryReport {
        results,
        score,
        warnings,
    }
}
