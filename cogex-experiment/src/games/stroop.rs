//! Color-word interference: name the ink, ignore the word.

use cogex_core::stats::mean_rounded;
use cogex_core::{BestScore, Choice, ColorWord, GameKey, InkColor, RunSummary, TrialPhase};
use rand::Rng;

use crate::config::StroopConfig;
use crate::metrics::StatusLine;
use crate::session::{Game, GameRun, ResponseWindow, RunContext, Termination, TrialPlan};
use crate::surface::{Display, Input};

/// Ink uniform over the palette; the word matches it with probability
/// `congruent_probability`, otherwise it is one of the other four names.
pub fn generate_color_word<R: Rng + ?Sized>(rng: &mut R, congruent_probability: f64) -> ColorWord {
    let ink = InkColor::ALL[rng.random_range(0..InkColor::ALL.len())];
    if rng.random_bool(congruent_probability) {
        return ColorWord { word: ink, ink };
    }
    let others: Vec<InkColor> = InkColor::ALL.into_iter().filter(|c| *c != ink).collect();
    let word = others[rng.random_range(0..others.len())];
    ColorWord { word, ink }
}

#[derive(Debug, Clone)]
pub struct StroopGame {
    config: StroopConfig,
    phase: TrialPhase,
}

impl StroopGame {
    pub fn new(config: StroopConfig) -> Self {
        Self {
            config,
            phase: TrialPhase::Idle,
        }
    }

    fn present_next(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        let stimulus = generate_color_word(cx.rng(), self.config.congruent_probability);
        if let Some(index) = cx.present(stimulus) {
            self.phase = TrialPhase::Stimulus;
            cx.show(Display::ColorWord {
                stimulus,
                trial: index + 1,
                of: self.config.trials,
            });
        }
    }
}

impl Game for StroopGame {
    type Stimulus = ColorWord;
    type Outcome = Choice;
    type Timer = ();
    type Phase = TrialPhase;

    fn key(&self) -> GameKey {
        GameKey::Stroop
    }

    fn plan(&self) -> TrialPlan {
        TrialPlan {
            window: ResponseWindow::Unbounded,
            termination: Termination::FixedCount(self.config.trials),
        }
    }

    fn phase(&self) -> TrialPhase {
        self.phase
    }

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        self.present_next(cx);
    }

    fn on_timer(&mut self, _: (), _: &mut RunContext<'_, '_, Self>) {}

    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>) {
        let Input::Color(choice) = input else {
            return;
        };
        let Some((index, stimulus)) = cx.pending() else {
            return;
        };
        let ink = stimulus.ink;
        cx.classify(index, Choice::from_match(choice == ink), true);
        if cx.presented() < self.config.trials {
            self.present_next(cx);
        } else {
            cx.show(Display::prompt("Done"));
        }
    }

    fn summarize(&self, run: &GameRun<Self>) -> RunSummary {
        let tally = run.tally();
        RunSummary::Stroop {
            accuracy_pct: cogex_core::stats::percent(tally.correct, self.config.trials),
            mean_latency_ms: mean_rounded(&run.latencies_ms()).unwrap_or(0),
            trials: run.presented(),
            tally,
        }
    }

    fn final_best(&self, summary: &RunSummary) -> Option<BestScore> {
        match summary {
            RunSummary::Stroop {
                accuracy_pct,
                mean_latency_ms,
                ..
            } => Some(BestScore::AccuracyLatency {
                accuracy_pct: *accuracy_pct,
                mean_latency_ms: *mean_latency_ms,
            }),
            _ => None,
        }
    }

    fn status(&self, run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String {
        let mut line = StatusLine::new();
        if let Some(run) = run {
            let tally = run.tally();
            line = line
                .text(format!("Trial {}/{}", run.presented(), self.config.trials))
                .field("Accuracy", format!("{}%", tally.accuracy_pct()))
                .maybe(
                    "Mean RT",
                    mean_rounded(&run.latencies_ms()).map(|ms| format!("{ms} ms")),
                );
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingSink;
    use crate::session::{Io, Session};
    use crate::store::{BestScoreStore, MemoryStore};
    use crate::surface::RecordingSurface;
    use cogex_core::ChoiceTally;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MS: u64 = 1_000_000;

    #[test]
    fn generator_respects_palette_and_congruence() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut congruent = 0;
        for _ in 0..2_000 {
            let cw = generate_color_word(&mut rng, 0.5);
            if cw.is_congruent() {
                congruent += 1;
            }
        }
        assert!((850..1150).contains(&congruent), "{congruent}");

        for _ in 0..200 {
            assert!(!generate_color_word(&mut rng, 0.0).is_congruent());
            assert!(generate_color_word(&mut rng, 1.0).is_congruent());
        }
    }

    fn current_ink(surface: &RecordingSurface) -> InkColor {
        match surface.last_frame() {
            Some(Display::ColorWord { stimulus, .. }) => stimulus.ink,
            other => panic!("expected a color word, got {other:?}"),
        }
    }

    fn wrong(ink: InkColor) -> InkColor {
        if ink == InkColor::Red {
            InkColor::Blue
        } else {
            InkColor::Red
        }
    }

    fn play(store: &MemoryStore, wrong_answers: usize, rt_ms: u64) -> cogex_core::RunReport {
        let mut rng = StdRng::seed_from_u64(21);
        let mut surface = RecordingSurface::new();
        let probe = surface.clone();
        let mut sink = CollectingSink::new();
        let mut session = Session::new(StroopGame::new(StroopConfig::default()));

        let mut now = 0;
        let mut io = Io {
            now,
            rng: &mut rng,
            surface: &mut surface,
            sink: &mut sink,
            store,
        };
        session.start(&mut io);
        let mut report = None;
        for trial in 0..20 {
            now += rt_ms * MS;
            io.now = now;
            let ink = current_ink(&probe);
            let answer = if trial < wrong_answers { wrong(ink) } else { ink };
            report = session.respond(Input::Color(answer), &mut io);
        }
        report.expect("run completes after the 20th answer")
    }

    #[test]
    fn twenty_trials_give_rounded_accuracy() {
        let store = MemoryStore::new();
        let report = play(&store, 3, 480);
        assert_eq!(
            report.summary,
            RunSummary::Stroop {
                accuracy_pct: 85,
                mean_latency_ms: 480,
                trials: 20,
                tally: ChoiceTally {
                    correct: 17,
                    incorrect: 3,
                },
            }
        );
        assert_eq!(report.trials.len(), 20);
        assert_eq!(
            store.read(GameKey::Stroop).unwrap(),
            Some(BestScore::AccuracyLatency {
                accuracy_pct: 85,
                mean_latency_ms: 480,
            })
        );
    }

    #[test]
    fn best_needs_accuracy_or_faster_tie() {
        let store = MemoryStore::new();
        play(&store, 1, 500);
        play(&store, 3, 300);
        assert_eq!(
            store.read(GameKey::Stroop).unwrap(),
            Some(BestScore::AccuracyLatency {
                accuracy_pct: 95,
                mean_latency_ms: 500,
            })
        );
        play(&store, 1, 450);
        assert_eq!(
            store.read(GameKey::Stroop).unwrap(),
            Some(BestScore::AccuracyLatency {
                accuracy_pct: 95,
                mean_latency_ms: 450,
            })
        );
    }

    #[test]
    fn non_color_input_is_ignored() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut surface = RecordingSurface::new();
        let mut sink = CollectingSink::new();
        let store = MemoryStore::new();
        let mut session = Session::new(StroopGame::new(StroopConfig::default()));
        let mut io = Io {
            now: 0,
            rng: &mut rng,
            surface: &mut surface,
            sink: &mut sink,
            store: &store,
        };
        session.start(&mut io);
        assert!(session.respond(Input::Press, &mut io).is_none());
        assert_eq!(session.run().unwrap().classified(), 0);
        let line = session.status_line(&store);
        assert!(line.starts_with("Trial 1/20"), "{line}");
    }
}
