//! Sequence recall: watch the pads flash, then repeat the sequence. Each
//! cleared round adds one pad.

use cogex_core::{BestScore, Choice, GameKey, Pad, RunSummary, SimonPhase};
use rand::Rng;

use crate::config::SimonConfig;
use crate::metrics::StatusLine;
use crate::session::{Game, GameRun, ResponseWindow, RunContext, Termination, TrialPlan};
use crate::surface::{Display, Input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimonTimer {
    Flash(usize),
    Dark(usize),
    OpenInput,
}

#[derive(Debug, Clone)]
pub struct SimonGame {
    config: SimonConfig,
    phase: SimonPhase,
    sequence: Vec<Pad>,
    position: usize,
    /// Levels cleared in the current run.
    level: u32,
}

impl SimonGame {
    pub fn new(config: SimonConfig) -> Self {
        Self {
            config,
            phase: SimonPhase::Idle,
            sequence: Vec::new(),
            position: 0,
            level: 0,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sequence(&self) -> &[Pad] {
        &self.sequence
    }

    fn next_round(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        let pad = Pad::ALL[cx.rng().random_range(0..Pad::ALL.len())];
        self.sequence.push(pad);
        self.position = 0;
        self.phase = SimonPhase::LeadIn;
        tracing::debug!(length = self.sequence.len(), "simon replay");
        cx.show(Display::Pads {
            lit: None,
            accepting: false,
        });
        cx.schedule(self.config.lead_in_ms, SimonTimer::Flash(0));
    }

    fn expect_next(&self, cx: &mut RunContext<'_, '_, Self>) {
        if let Some(pad) = self.sequence.get(self.position) {
            cx.present(*pad);
        }
    }
}

impl Game for SimonGame {
    type Stimulus = Pad;
    type Outcome = Choice;
    type Timer = SimonTimer;
    type Phase = SimonPhase;

    fn key(&self) -> GameKey {
        GameKey::Simon
    }

    fn plan(&self) -> TrialPlan {
        TrialPlan {
            window: ResponseWindow::Unbounded,
            termination: Termination::FailStops,
        }
    }

    fn phase(&self) -> SimonPhase {
        self.phase
    }

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        self.sequence.clear();
        self.level = 0;
        self.next_round(cx);
    }

    fn on_timer(&mut self, timer: SimonTimer, cx: &mut RunContext<'_, '_, Self>) {
        match timer {
            SimonTimer::Flash(i) => {
                let Some(pad) = self.sequence.get(i).copied() else {
                    return;
                };
                self.phase = SimonPhase::Replay;
                cx.show(Display::Pads {
                    lit: Some(pad),
                    accepting: false,
                });
                cx.schedule(self.config.flash_ms, SimonTimer::Dark(i));
            }
            SimonTimer::Dark(i) => {
                cx.show(Display::Pads {
                    lit: None,
                    accepting: false,
                });
                let next = if i + 1 < self.sequence.len() {
                    SimonTimer::Flash(i + 1)
                } else {
                    SimonTimer::OpenInput
                };
                cx.schedule(self.config.gap_ms, next);
            }
            SimonTimer::OpenInput => {
                self.phase = SimonPhase::Input;
                self.expect_next(cx);
                cx.show(Display::Pads {
                    lit: None,
                    accepting: true,
                });
            }
        }
    }

    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>) {
        let Input::Pad(pressed) = input else {
            return;
        };
        let Some((index, expected)) = cx.pending() else {
            return;
        };
        let correct = pressed == *expected;
        cx.classify(index, Choice::from_match(correct), true);

        if !correct {
            self.phase = SimonPhase::Failed;
            tracing::debug!(level = self.level, "simon sequence broken");
            cx.show(Display::Pads {
                lit: None,
                accepting: false,
            });
            cx.finish();
            return;
        }

        self.position += 1;
        if self.position < self.sequence.len() {
            self.expect_next(cx);
            return;
        }

        self.level += 1;
        cx.propose_best(BestScore::Level { level: self.level });
        if self.config.max_level.is_some_and(|max| self.level >= max) {
            cx.show(Display::prompt("Done"));
            cx.finish();
        } else {
            self.next_round(cx);
        }
    }

    fn summarize(&self, _run: &GameRun<Self>) -> RunSummary {
        RunSummary::Simon {
            level: self.level,
            sequence_length: self.sequence.len(),
        }
    }

    fn status(&self, run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String {
        let mut line = StatusLine::new();
        if run.is_some() {
            line = line.field("Level", self.level);
            if self.phase == SimonPhase::Failed {
                line = line.text("Sequence broken");
            }
        }
        line.best(best).build()
    }

    fn halt(&mut self) {
        if self.phase != SimonPhase::Failed {
            self.phase = SimonPhase::Idle;
        }
    }

    fn reset(&mut self) {
        self.phase = SimonPhase::Idle;
        self.sequence.clear();
        self.position = 0;
        self.level = 0;
    }
}
