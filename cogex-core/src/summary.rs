use serde::{Deserialize, Serialize};

use crate::game::GameKey;
use crate::trial::{ChoiceTally, DetectionTally, ReactionOutcome, TrialRecord};

/// How a run ended. Aborted runs never produce a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunEnd {
    Completed,
    Aborted,
}

/// Per-game summary of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunSummary {
    Reaction {
        outcome: ReactionOutcome,
        latency_ms: Option<u64>,
    },
    Stroop {
        accuracy_pct: u32,
        mean_latency_ms: u64,
        trials: usize,
        tally: ChoiceTally,
    },
    NBack {
        accuracy_pct: u32,
        length: usize,
        targets: usize,
        tally: DetectionTally,
    },
    GoNoGo {
        accuracy_pct: u32,
        tally: DetectionTally,
    },
    Simon {
        level: u32,
        sequence_length: usize,
    },
    MemoryGrid {
        level_cleared: u32,
        grid_side: usize,
        failed: bool,
    },
}

impl RunSummary {
    pub fn game(&self) -> GameKey {
        match self {
            RunSummary::Reaction { .. } => GameKey::Reaction,
            RunSummary::Stroop { .. } => GameKey::Stroop,
            RunSummary::NBack { .. } => GameKey::NBack,
            RunSummary::GoNoGo { .. } => GameKey::GoNoGo,
            RunSummary::Simon { .. } => GameKey::Simon,
            RunSummary::MemoryGrid { .. } => GameKey::MemoryGrid,
        }
    }

    pub fn accuracy_pct(&self) -> Option<u32> {
        match self {
            RunSummary::Stroop { accuracy_pct, .. }
            | RunSummary::NBack { accuracy_pct, .. }
            | RunSummary::GoNoGo { accuracy_pct, .. } => Some(*accuracy_pct),
            _ => None,
        }
    }

    pub fn level(&self) -> Option<u32> {
        match self {
            RunSummary::Simon { level, .. } => Some(*level),
            RunSummary::MemoryGrid { level_cleared, .. } => Some(*level_cleared),
            _ => None,
        }
    }

    pub fn latency_ms(&self) -> Option<u64> {
        match self {
            RunSummary::Reaction { latency_ms, .. } => *latency_ms,
            RunSummary::Stroop {
                mean_latency_ms, ..
            } => Some(*mean_latency_ms),
            _ => None,
        }
    }
}

/// Result record emitted once per completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub game: GameKey,
    pub summary: RunSummary,
    pub trials: Vec<TrialRecord>,
    pub started_at_ns: u64,
    pub finished_at_ns: u64,
}
