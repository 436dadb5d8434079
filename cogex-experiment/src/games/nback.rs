//! Letter-stream N-back. Every letter stays pending until the participant
//! presses "match" or the next letter replaces it.

use cogex_core::{
    BestScore, Detection, GameKey, Letter, RunSummary, Stimulus, TrialPhase,
};
use cogex_core::stimulus::LETTERS;
use rand::Rng;

use crate::config::NBackConfig;
use crate::metrics::StatusLine;
use crate::session::{Game, GameRun, ResponseWindow, RunContext, Termination, TrialPlan};
use crate::surface::{Display, Input};

/// A letter of the stream, tagged with whether it repeats the one `n` back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NBackItem {
    pub letter: Letter,
    pub target: bool,
}

impl Stimulus for NBackItem {
    fn describe(&self) -> String {
        if self.target {
            format!("{} (target)", self.letter)
        } else {
            self.letter.to_string()
        }
    }
}

pub fn is_target(sequence: &[Letter], index: usize, n: usize) -> bool {
    index >= n && index < sequence.len() && sequence[index] == sequence[index - n]
}

/// Next letter for a stream whose previous letters are `history`. Once `n`
/// letters exist, it repeats the letter `n` back with probability
/// `target_probability` and otherwise avoids it.
pub fn next_letter<R: Rng + ?Sized>(
    rng: &mut R,
    history: &[Letter],
    n: usize,
    target_probability: f64,
) -> Letter {
    let alphabet: Vec<Letter> = LETTERS.chars().map(Letter).collect();
    let i = history.len();
    if i < n {
        return alphabet[rng.random_range(0..alphabet.len())];
    }
    let back = history[i - n];
    if rng.random_bool(target_probability) {
        return back;
    }
    let others: Vec<Letter> = alphabet.into_iter().filter(|l| *l != back).collect();
    others[rng.random_range(0..others.len())]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NBackTimer {
    Tick,
}

#[derive(Debug, Clone)]
pub struct NBackGame {
    config: NBackConfig,
    phase: TrialPhase,
    sequence: Vec<Letter>,
}

impl NBackGame {
    pub fn new(config: NBackConfig) -> Self {
        Self {
            config,
            phase: TrialPhase::Idle,
            sequence: Vec::new(),
        }
    }

    pub fn sequence(&self) -> &[Letter] {
        &self.sequence
    }

    fn track_best(&self, cx: &mut RunContext<'_, '_, Self>) {
        if self.sequence.len() >= self.config.best_min_length {
            let pct = cx.run().tally().accuracy_pct();
            cx.propose_best(BestScore::Accuracy { pct });
        }
    }
}

impl Game for NBackGame {
    type Stimulus = NBackItem;
    type Outcome = Detection;
    type Timer = NBackTimer;
    type Phase = TrialPhase;

    fn key(&self) -> GameKey {
        GameKey::NBack
    }

    fn plan(&self) -> TrialPlan {
        TrialPlan {
            window: ResponseWindow::UntilNextStimulus,
            termination: self
                .config
                .max_stimuli
                .map_or(Termination::OpenEnded, Termination::FixedCount),
        }
    }

    fn phase(&self) -> TrialPhase {
        self.phase
    }

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        self.sequence.clear();
        self.phase = TrialPhase::Interval;
        cx.show(Display::Blank);
        cx.schedule(self.config.interval_ms, NBackTimer::Tick);
    }

    fn on_timer(&mut self, _tick: NBackTimer, cx: &mut RunContext<'_, '_, Self>) {
        if self
            .config
            .max_stimuli
            .is_some_and(|max| self.sequence.len() >= max)
        {
            cx.resolve_pending_silently();
            self.track_best(cx);
            return;
        }

        let n = self.config.n;
        let letter = next_letter(cx.rng(), &self.sequence, n, self.config.target_probability);
        self.sequence.push(letter);
        let index = self.sequence.len() - 1;
        let target = is_target(&self.sequence, index, n);

        // Presenting resolves the letter it replaces.
        cx.present(NBackItem { letter, target });
        self.track_best(cx);

        self.phase = TrialPhase::Stimulus;
        cx.show(Display::Letter { letter, index });
        cx.schedule(self.config.interval_ms, NBackTimer::Tick);
    }

    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>) {
        if input != Input::Press {
            return;
        }
        let Some((index, item)) = cx.pending() else {
            tracing::debug!("match press dropped: letter already answered");
            return;
        };
        let outcome = Detection::classify(item.target, true);
        cx.classify(index, outcome, true);
        self.track_best(cx);
    }

    fn on_silence(item: &NBackItem) -> Option<Detection> {
        Some(Detection::classify(item.target, false))
    }

    fn summarize(&self, run: &GameRun<Self>) -> RunSummary {
        let tally = run.tally();
        RunSummary::NBack {
            accuracy_pct: tally.accuracy_pct(),
            length: run.presented(),
            targets: run.trials.iter().filter(|t| t.stimulus.target).count(),
            tally,
        }
    }

    fn status(&self, run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String {
        let mut line = StatusLine::new();
        if let Some(run) = run {
            let tally = run.tally();
            line = line
                .text(format!("{}-back", self.config.n))
                .field("Letters", run.presented())
                .field("Accuracy", format!("{}%", tally.accuracy_pct()))
                .field("Hits", tally.hits)
                .field("False alarms", tally.false_alarms);
        }
        line.best(best).build()
    }

    fn halt(&mut self) {
        self.phase = TrialPhase::Idle;
    }

    fn reset(&mut self) {
        self.halt();
        self.sequence.clear();
    }
}
