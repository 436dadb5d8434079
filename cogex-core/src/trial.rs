use serde::{Deserialize, Serialize};

use crate::stats::{ns_to_ms, percent};
use crate::stimulus::Stimulus;

/// Outcome category assigned to a classified trial
pub trait Outcome: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug {
    type Tally: Default + Clone + std::fmt::Debug;

    fn is_correct(&self) -> bool;
    fn label(&self) -> &'static str;
    fn record(&self, tally: &mut Self::Tally);
}

/// Signal-detection outcomes for two-alternative games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    Hit,
    Miss,
    FalseAlarm,
    CorrectRejection,
}

impl Detection {
    /// Outcome of a response (or its absence) to a target / non-target.
    pub fn classify(target: bool, responded: bool) -> Self {
        match (target, responded) {
            (true, true) => Detection::Hit,
            (true, false) => Detection::Miss,
            (false, true) => Detection::FalseAlarm,
            (false, false) => Detection::CorrectRejection,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionTally {
    pub hits: usize,
    pub misses: usize,
    pub false_alarms: usize,
    pub correct_rejections: usize,
}

impl DetectionTally {
    pub fn classified(&self) -> usize {
        self.hits + self.misses + self.false_alarms + self.correct_rejections
    }

    pub fn correct(&self) -> usize {
        self.hits + self.correct_rejections
    }

    /// (hits + correct rejections) over everything classified so far.
    pub fn accuracy_pct(&self) -> u32 {
        percent(self.correct(), self.classified())
    }
}

impl Outcome for Detection {
    type Tally = DetectionTally;

    fn is_correct(&self) -> bool {
        matches!(self, Detection::Hit | Detection::CorrectRejection)
    }

    fn label(&self) -> &'static str {
        match self {
            Detection::Hit => "hit",
            Detection::Miss => "miss",
            Detection::FalseAlarm => "false_alarm",
            Detection::CorrectRejection => "correct_rejection",
        }
    }

    fn record(&self, tally: &mut DetectionTally) {
        match self {
            Detection::Hit => tally.hits += 1,
            Detection::Miss => tally.misses += 1,
            Detection::FalseAlarm => tally.false_alarms += 1,
            Detection::CorrectRejection => tally.correct_rejections += 1,
        }
    }
}

/// Outcomes for multi-alternative games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Correct,
    Incorrect,
}

impl Choice {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Choice::Correct
        } else {
            Choice::Incorrect
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceTally {
    pub correct: usize,
    pub incorrect: usize,
}

impl ChoiceTally {
    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }

    pub fn accuracy_pct(&self) -> u32 {
        percent(self.correct, self.total())
    }
}

impl Outcome for Choice {
    type Tally = ChoiceTally;

    fn is_correct(&self) -> bool {
        matches!(self, Choice::Correct)
    }

    fn label(&self) -> &'static str {
        match self {
            Choice::Correct => "correct",
            Choice::Incorrect => "incorrect",
        }
    }

    fn record(&self, tally: &mut ChoiceTally) {
        match self {
            Choice::Correct => tally.correct += 1,
            Choice::Incorrect => tally.incorrect += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionOutcome {
    Responded,
    TooEarly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTally {
    pub responded: usize,
    pub too_early: usize,
}

impl Outcome for ReactionOutcome {
    type Tally = ReactionTally;

    fn is_correct(&self) -> bool {
        matches!(self, ReactionOutcome::Responded)
    }

    fn label(&self) -> &'static str {
        match self {
            ReactionOutcome::Responded => "responded",
            ReactionOutcome::TooEarly => "too_early",
        }
    }

    fn record(&self, tally: &mut ReactionTally) {
        match self {
            ReactionOutcome::Responded => tally.responded += 1,
            ReactionOutcome::TooEarly => tally.too_early += 1,
        }
    }
}

/// One stimulus-response unit. Pending until `outcome` is set; never
/// reclassified afterwards.
#[derive(Debug, Clone)]
pub struct Trial<S, O> {
    pub index: usize,
    pub stimulus: S,
    pub presented_at: u64,
    pub responded_at: Option<u64>,
    pub outcome: Option<O>,
}

impl<S: Stimulus, O: Outcome> Trial<S, O> {
    pub fn new(index: usize, stimulus: S, presented_at: u64) -> Self {
        Self {
            index,
            stimulus,
            presented_at,
            responded_at: None,
            outcome: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }

    /// Classifies a pending trial. Returns false (and changes nothing) if the
    /// trial already has an outcome.
    pub fn classify(&mut self, outcome: O, responded_at: Option<u64>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.outcome = Some(outcome);
        self.responded_at = responded_at;
        true
    }

    pub fn latency_ns(&self) -> Option<u64> {
        self.responded_at
            .map(|r| r.saturating_sub(self.presented_at))
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ns().map(ns_to_ms)
    }
}

/// Flat, serializable view of a trial for result records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: usize,
    pub stimulus: String,
    pub outcome: Option<String>,
    pub latency_ms: Option<u64>,
}

impl<S: Stimulus, O: Outcome> From<&Trial<S, O>> for TrialRecord {
    fn from(trial: &Trial<S, O>) -> Self {
        Self {
            index: trial.index,
            stimulus: trial.stimulus.describe(),
            outcome: trial.outcome.map(|o| o.label().to_string()),
            latency_ms: trial.latency_ms(),
        }
    }
}
