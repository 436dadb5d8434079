//! Response inhibition: press for "go", hold back on "no-go".

use cogex_core::stats::percent;
use cogex_core::{BestScore, Detection, GameKey, RunSummary, Signal, TrialPhase};
use rand::Rng;

use crate::config::GoNoGoConfig;
use crate::metrics::StatusLine;
use crate::session::{Game, GameRun, ResponseWindow, RunContext, Termination, TrialPlan};
use crate::surface::{Display, Input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoNoGoTimer {
    NextStimulus,
}

#[derive(Debug, Clone)]
pub struct GoNoGoGame {
    config: GoNoGoConfig,
    phase: TrialPhase,
}

impl GoNoGoGame {
    pub fn new(config: GoNoGoConfig) -> Self {
        Self {
            config,
            phase: TrialPhase::Idle,
        }
    }
}

impl Game for GoNoGoGame {
    type Stimulus = Signal;
    type Outcome = Detection;
    type Timer = GoNoGoTimer;
    type Phase = TrialPhase;

    fn key(&self) -> GameKey {
        GameKey::GoNoGo
    }

    fn plan(&self) -> TrialPlan {
        TrialPlan {
            window: ResponseWindow::Bounded {
                ms: self.config.stimulus_ms,
            },
            termination: Termination::FixedCount(self.config.trials),
        }
    }

    fn phase(&self) -> TrialPhase {
        self.phase
    }

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        self.phase = TrialPhase::Interval;
        cx.show(Display::Blank);
        cx.schedule(self.config.isi_ms, GoNoGoTimer::NextStimulus);
    }

    fn on_timer(&mut self, _timer: GoNoGoTimer, cx: &mut RunContext<'_, '_, Self>) {
        let signal = if cx.rng().random_bool(self.config.nogo_probability) {
            Signal::NoGo
        } else {
            Signal::Go
        };
        if let Some(index) = cx.present(signal) {
            self.phase = TrialPhase::Stimulus;
            cx.show(Display::Signal {
                signal,
                trial: index + 1,
                of: self.config.trials,
            });
        }
    }

    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>) {
        if input != Input::Press {
            return;
        }
        let Some((index, signal)) = cx.pending() else {
            return;
        };
        let outcome = Detection::classify(*signal == Signal::Go, true);
        cx.classify(index, outcome, true);
    }

    fn on_window_closed(&mut self, _index: usize, cx: &mut RunContext<'_, '_, Self>) {
        self.phase = TrialPhase::Interval;
        if cx.presented() < self.config.trials {
            cx.show(Display::Blank);
            cx.schedule(self.config.isi_ms, GoNoGoTimer::NextStimulus);
        } else {
            cx.show(Display::prompt("Done"));
        }
    }

    fn on_silence(signal: &Signal) -> Option<Detection> {
        Some(Detection::classify(*signal == Signal::Go, false))
    }

    fn summarize(&self, run: &GameRun<Self>) -> RunSummary {
        let tally = run.tally();
        RunSummary::GoNoGo {
            accuracy_pct: percent(tally.correct(), self.config.trials),
            tally,
        }
    }

    fn final_best(&self, summary: &RunSummary) -> Option<BestScore> {
        summary.accuracy_pct().map(|pct| BestScore::Accuracy { pct })
    }

    fn status(&self, run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String {
        let mut line = StatusLine::new();
        if let Some(run) = run {
            let tally = run.tally();
            line = line
                .text(format!("Trial {}/{}", run.presented(), self.config.trials))
                .field("Hits", tally.hits)
                .field("Misses", tally.misses)
                .field("False alarms", tally.false_alarms)
                .field("Correct rejections", tally.correct_rejections);
        }
        line.best(best).build()
    }

    fn halt(&mut self) {
        self.phase = TrialPhase::Idle;
    }

    fn reset(&mut self) {
        self.halt();
    }
}
