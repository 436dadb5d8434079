//! Simple reaction time: wait for a random delay, then press as fast as
//! possible.

use cogex_core::{
    BestScore, GameKey, ReactionCue, ReactionOutcome, ReactionPhase, RunSummary,
};
use cogex_timing::{TimerHandle, uniform_delay_ms};

use crate::config::ReactionConfig;
use crate::metrics::{LatencyStats, StatusLine};
use crate::session::{Game, GameRun, ResponseWindow, RunContext, Termination, TrialPlan};
use crate::surface::{Display, Input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTimer {
    Ready,
}

#[derive(Debug, Clone)]
pub struct ReactionGame {
    config: ReactionConfig,
    phase: ReactionPhase,
    ready_timer: Option<TimerHandle>,
    /// Latencies of every valid response since the last reset.
    latencies_ms: Vec<u64>,
}

impl ReactionGame {
    pub fn new(config: ReactionConfig) -> Self {
        Self {
            config,
            phase: ReactionPhase::Idle,
            ready_timer: None,
            latencies_ms: Vec::new(),
        }
    }

    pub fn latencies_ms(&self) -> &[u64] {
        &self.latencies_ms
    }

    pub fn stats(&self) -> LatencyStats {
        LatencyStats::from_ms(&self.latencies_ms)
    }
}

impl Game for ReactionGame {
    type Stimulus = ReactionCue;
    type Outcome = ReactionOutcome;
    type Timer = ReactionTimer;
    type Phase = ReactionPhase;

    fn key(&self) -> GameKey {
        GameKey::Reaction
    }

    fn plan(&self) -> TrialPlan {
        TrialPlan {
            window: ResponseWindow::Unbounded,
            termination: Termination::FixedCount(1),
        }
    }

    fn phase(&self) -> ReactionPhase {
        self.phase
    }

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        let delay = uniform_delay_ms(cx.rng(), self.config.min_delay_ms, self.config.max_delay_ms);
        self.phase = ReactionPhase::Waiting;
        self.ready_timer = Some(cx.schedule(delay, ReactionTimer::Ready));
        tracing::debug!(delay_ms = delay, "reaction cue scheduled");
        cx.show(Display::Reaction {
            cue: ReactionCue::Wait,
        });
    }

    fn on_timer(&mut self, timer: ReactionTimer, cx: &mut RunContext<'_, '_, Self>) {
        match timer {
            ReactionTimer::Ready if self.phase == ReactionPhase::Waiting => {
                self.ready_timer = None;
                self.phase = ReactionPhase::Ready;
                cx.present(ReactionCue::Go);
                cx.show(Display::Reaction {
                    cue: ReactionCue::Go,
                });
            }
            ReactionTimer::Ready => {}
        }
    }

    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>) {
        if input != Input::Press {
            return;
        }
        match self.phase {
            ReactionPhase::Waiting => {
                if let Some(handle) = self.ready_timer.take() {
                    cx.cancel(handle);
                }
                if let Some(index) = cx.present(ReactionCue::Wait) {
                    cx.classify(index, ReactionOutcome::TooEarly, false);
                }
                self.phase = ReactionPhase::Idle;
                cx.show(Display::prompt("Too early! Wait for the cue."));
            }
            ReactionPhase::Ready => {
                let Some((index, _)) = cx.pending() else {
                    return;
                };
                cx.classify(index, ReactionOutcome::Responded, true);
                let Some(ms) = cx.trial(index).and_then(|t| t.latency_ms()) else {
                    return;
                };
                self.latencies_ms.push(ms);
                self.phase = ReactionPhase::Idle;
                cx.propose_best(BestScore::Latency { ms });
                cx.show(Display::prompt(format!("{ms} ms")));
            }
            ReactionPhase::Idle => {}
        }
    }

    fn summarize(&self, run: &GameRun<Self>) -> RunSummary {
        let last = run.last();
        RunSummary::Reaction {
            outcome: last
                .and_then(|t| t.outcome)
                .unwrap_or(ReactionOutcome::TooEarly),
            latency_ms: last.and_then(|t| t.latency_ms()),
        }
    }

    fn status(&self, _run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String {
        let stats = self.stats();
        StatusLine::new()
            .maybe("Last", stats.last.map(|ms| format!("{ms} ms")))
            .maybe(
                &format!("Mean ({})", stats.count),
                stats.mean.map(|ms| format!("{ms} ms")),
            )
            .best(best)
            .build()
    }

    fn halt(&mut self) {
        self.phase = ReactionPhase::Idle;
        self.ready_timer = None;
    }

    fn reset(&mut self) {
        self.halt();
        self.latencies_ms.clear();
    }
}
