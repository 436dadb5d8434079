//! The timed-trial state machine shared by every game.
//!
//! A [`Session`] owns one game, the current run, a cancellable timer queue
//! and the last frame shown. Games only describe *what* happens through the
//! [`Game`] hooks; the session enforces the run lifecycle: re-entrancy on
//! start, phase-gated input, response windows, completion and reporting.

use cogex_core::{BestScore, GameKey, Phase, RunEnd, RunReport, RunSummary, Trial};
use cogex_timing::{TimerHandle, TimerQueue};
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::report::ResultSink;
use crate::store::BestScoreStore;
use crate::surface::{Display, Input, Surface};
use crate::trial::Run;

/// How long a presented trial accepts a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseWindow {
    /// Until the game classifies it.
    Unbounded,
    /// Closed by the session after `ms`; silence is classified by
    /// [`Game::on_silence`].
    Bounded { ms: u64 },
    /// Resolved by [`Game::on_silence`] when the next stimulus is presented.
    UntilNextStimulus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Completes once `n` trials are presented and classified.
    FixedCount(usize),
    /// Runs until stopped or until the game finishes it.
    OpenEnded,
    /// Runs until the game reports a failure.
    FailStops,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialPlan {
    pub window: ResponseWindow,
    pub termination: Termination,
}

/// Collaborators lent to a session for the duration of one call.
pub struct Io<'a> {
    pub now: u64,
    pub rng: &'a mut dyn RngCore,
    pub surface: &'a mut dyn Surface,
    pub sink: &'a mut dyn ResultSink,
    pub store: &'a dyn BestScoreStore,
}

#[derive(Debug, Clone)]
enum Scheduled<E> {
    Game(E),
    CloseWindow(usize),
}

#[derive(Debug, Default, Clone)]
struct Screen {
    display: Option<Display>,
    revision: u64,
}

pub type GameRun<G> = Run<<G as Game>::Stimulus, <G as Game>::Outcome>;

pub trait Game: Sized {
    type Stimulus: cogex_core::Stimulus;
    type Outcome: cogex_core::Outcome;
    type Timer: Clone + std::fmt::Debug;
    type Phase: Phase;

    fn key(&self) -> GameKey;
    fn plan(&self) -> TrialPlan;
    fn phase(&self) -> Self::Phase;

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>);
    fn on_timer(&mut self, timer: Self::Timer, cx: &mut RunContext<'_, '_, Self>);
    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>);

    /// Called after a bounded window closed and its trial was resolved.
    fn on_window_closed(&mut self, _index: usize, _cx: &mut RunContext<'_, '_, Self>) {}

    /// Outcome of a trial that never got a response.
    fn on_silence(_stimulus: &Self::Stimulus) -> Option<Self::Outcome> {
        None
    }

    fn summarize(&self, run: &GameRun<Self>) -> RunSummary;

    /// Best score derived from a completed run, for games that only know it
    /// at the end.
    fn final_best(&self, _summary: &RunSummary) -> Option<BestScore> {
        None
    }

    fn status(&self, run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String;

    /// The run ended, completed or stopped.
    fn halt(&mut self);

    /// Clears progress kept across runs.
    fn reset(&mut self);
}

fn commit_best(store: &dyn BestScoreStore, key: GameKey, score: &BestScore, warnings: &mut Vec<String>) {
    match store.compare_and_set(key, score) {
        Ok(true) => info!(game = %key, best = %score, "new best score"),
        Ok(false) => {}
        Err(e) => {
            warn!(game = %key, error = %e, "best score not saved");
            warnings.push(format!("best score not saved: {e}"));
        }
    }
}

/// What a game hook may do to the active run.
pub struct RunContext<'s, 'io, G: Game> {
    key: GameKey,
    plan: TrialPlan,
    io: &'s mut Io<'io>,
    run: &'s mut GameRun<G>,
    timers: &'s mut TimerQueue<Scheduled<G::Timer>>,
    screen: &'s mut Screen,
    warnings: &'s mut Vec<String>,
    finished: bool,
}

impl<G: Game> RunContext<'_, '_, G> {
    pub fn now(&self) -> u64 {
        self.io.now
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.io.rng
    }

    pub fn run(&self) -> &GameRun<G> {
        self.run
    }

    pub fn presented(&self) -> usize {
        self.run.presented()
    }

    pub fn trial(&self, index: usize) -> Option<&Trial<G::Stimulus, G::Outcome>> {
        self.run.trials.get(index)
    }

    /// The most recent trial, if it still awaits classification.
    pub fn pending(&self) -> Option<(usize, &G::Stimulus)> {
        let index = self.run.pending_last()?;
        Some((index, &self.run.trials[index].stimulus))
    }

    /// Presents a new trial. Refused once a fixed-count run has presented
    /// all its trials.
    pub fn present(&mut self, stimulus: G::Stimulus) -> Option<usize> {
        if let Termination::FixedCount(n) = self.plan.termination {
            if self.run.presented() >= n {
                debug!(game = %self.key, n, "presentation refused: trial count reached");
                return None;
            }
        }
        if self.plan.window == ResponseWindow::UntilNextStimulus {
            self.resolve_pending_silently();
        }
        let index = self.run.present(stimulus, self.io.now);
        if let ResponseWindow::Bounded { ms } = self.plan.window {
            self.timers
                .schedule_after_ms(self.io.now, ms, Scheduled::CloseWindow(index));
        }
        debug!(game = %self.key, index, "stimulus presented");
        Some(index)
    }

    /// Classifies trial `index`. `responded` stamps the response time.
    /// Refused for unknown or already classified trials.
    pub fn classify(&mut self, index: usize, outcome: G::Outcome, responded: bool) -> bool {
        use cogex_core::Outcome;

        let now = self.io.now;
        let Some(trial) = self.run.trials.get_mut(index) else {
            return false;
        };
        if trial.classify(outcome, responded.then_some(now)) {
            debug!(game = %self.key, index, outcome = outcome.label(), "trial classified");
            true
        } else {
            debug!(game = %self.key, index, "already classified, response dropped");
            false
        }
    }

    /// Resolves the latest trial as unanswered, if it is still pending.
    pub fn resolve_pending_silently(&mut self) {
        let Some(index) = self.run.pending_last() else {
            return;
        };
        if let Some(outcome) = G::on_silence(&self.run.trials[index].stimulus) {
            self.classify(index, outcome, false);
        }
    }

    fn close_window(&mut self, index: usize) {
        let Some(trial) = self.run.trials.get(index) else {
            return;
        };
        if !trial.is_pending() {
            return;
        }
        if let Some(outcome) = G::on_silence(&trial.stimulus) {
            self.classify(index, outcome, false);
        }
    }

    pub fn schedule(&mut self, delay_ms: u64, timer: G::Timer) -> TimerHandle {
        self.timers
            .schedule_after_ms(self.io.now, delay_ms, Scheduled::Game(timer))
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle)
    }

    pub fn show(&mut self, display: Display) {
        self.io.surface.show(&display);
        self.screen.display = Some(display);
        self.screen.revision += 1;
    }

    /// Commits `score` immediately if it beats the stored best.
    pub fn propose_best(&mut self, score: BestScore) {
        commit_best(self.io.store, self.key, &score, self.warnings);
    }

    /// Ends the run as completed once the hook returns.
    pub fn finish(&mut self) {
        self.finished = true;
    }
}

pub struct Session<G: Game> {
    game: G,
    run: Option<GameRun<G>>,
    active: bool,
    timers: TimerQueue<Scheduled<G::Timer>>,
    screen: Screen,
    warnings: Vec<String>,
}

impl<G: Game> Session<G> {
    pub fn new(game: G) -> Self {
        Self {
            game,
            run: None,
            active: false,
            timers: TimerQueue::new(),
            screen: Screen::default(),
            warnings: Vec::new(),
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    /// The active run, or the last one until superseded or reset.
    pub fn run(&self) -> Option<&GameRun<G>> {
        self.run.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Starts a run. A no-op returning false while one is active.
    pub fn start(&mut self, io: &mut Io<'_>) -> bool {
        let key = self.game.key();
        if self.active {
            debug!(game = %key, "start ignored: run already active");
            return false;
        }
        self.timers.cancel_all();
        self.warnings.clear();
        self.run = Some(Run::new(io.now));
        self.active = true;
        debug!(game = %key, "run started");
        self.dispatch(io, |game, cx| game.begin(cx));
        true
    }

    pub fn respond(&mut self, input: Input, io: &mut Io<'_>) -> Option<RunReport> {
        if !self.active {
            debug!(game = %self.game.key(), ?input, "input dropped: no active run");
            return None;
        }
        // Overdue timers fire first so a late press never lands on a closed window.
        if let Some(report) = self.fire_due(io) {
            debug!(game = %self.game.key(), ?input, "input dropped: run completed first");
            return Some(report);
        }
        if !self.active {
            debug!(game = %self.game.key(), ?input, "input dropped: run ended");
            return None;
        }
        let phase = self.game.phase();
        if !phase.allows_input() {
            debug!(game = %self.game.key(), phase = phase.label(), ?input, "input dropped");
            return None;
        }
        self.dispatch(io, |game, cx| game.on_input(input, cx))
    }

    /// Fires every timer due at `io.now`, in deadline order.
    pub fn update(&mut self, io: &mut Io<'_>) -> Option<RunReport> {
        self.fire_due(io)
    }

    /// Each timer fires with `io.now` set to its own deadline; `io.now` is
    /// restored afterwards.
    fn fire_due(&mut self, io: &mut Io<'_>) -> Option<RunReport> {
        let now = io.now;
        let mut report = None;
        while self.active {
            let Some((due, event)) = self.timers.pop_due_at(now) else {
                break;
            };
            io.now = due;
            report = match event {
                Scheduled::Game(timer) => self.dispatch(io, |game, cx| game.on_timer(timer, cx)),
                Scheduled::CloseWindow(index) => self.dispatch(io, |game, cx| {
                    cx.close_window(index);
                    game.on_window_closed(index, cx);
                }),
            };
        }
        io.now = now;
        report
    }

    /// Cancels every timer and aborts the run without a report. Returns
    /// false when nothing was running.
    pub fn stop(&mut self, io: &mut Io<'_>) -> bool {
        if !self.active {
            return false;
        }
        let cancelled = self.timers.cancel_all();
        self.active = false;
        if let Some(run) = self.run.as_mut() {
            run.finished_at = Some(io.now);
            run.end = Some(RunEnd::Aborted);
        }
        self.game.halt();
        info!(game = %self.game.key(), cancelled, "run stopped");
        let line = self.status_line(io.store);
        io.surface.status(&line);
        true
    }

    /// Stop, then forget the run, the last frame, warnings and game
    /// progress. Stored best scores are untouched.
    pub fn reset(&mut self, io: &mut Io<'_>) {
        self.stop(io);
        self.run = None;
        self.screen.display = None;
        self.screen.revision += 1;
        self.warnings.clear();
        self.game.reset();
        io.surface.clear();
        debug!(game = %self.game.key(), "session reset");
    }

    pub fn next_deadline(&self) -> Option<u64> {
        if self.active {
            self.timers.next_deadline()
        } else {
            None
        }
    }

    pub fn display(&self) -> Option<&Display> {
        self.screen.display.as_ref()
    }

    /// Bumped on every frame shown, so observers can spot repeats.
    pub fn display_revision(&self) -> u64 {
        self.screen.revision
    }

    pub fn status_line(&self, store: &dyn BestScoreStore) -> String {
        let key = self.game.key();
        let best = store.read(key).unwrap_or_else(|e| {
            debug!(game = %key, error = %e, "best score unavailable");
            None
        });
        let mut line = self.game.status(self.run.as_ref(), best.as_ref());
        for warning in &self.warnings {
            line.push_str(" • warning: ");
            line.push_str(warning);
        }
        line
    }

    fn dispatch<F>(&mut self, io: &mut Io<'_>, hook: F) -> Option<RunReport>
    where
        F: FnOnce(&mut G, &mut RunContext<'_, '_, G>),
    {
        let key = self.game.key();
        let plan = self.game.plan();
        let run = self.run.as_mut()?;
        let mut cx = RunContext {
            key,
            plan,
            io: &mut *io,
            run,
            timers: &mut self.timers,
            screen: &mut self.screen,
            warnings: &mut self.warnings,
            finished: false,
        };
        hook(&mut self.game, &mut cx);
        let finished = cx.finished;
        self.settle(io, finished)
    }

    fn settle(&mut self, io: &mut Io<'_>, finished: bool) -> Option<RunReport> {
        let count_reached = match (self.game.plan().termination, self.run.as_ref()) {
            (Termination::FixedCount(n), Some(run)) => run.presented() >= n && run.all_classified(),
            _ => false,
        };
        let report = if self.active && (finished || count_reached) {
            self.complete(io)
        } else {
            None
        };
        let line = self.status_line(io.store);
        io.surface.status(&line);
        report
    }

    fn complete(&mut self, io: &mut Io<'_>) -> Option<RunReport> {
        let key = self.game.key();
        self.timers.cancel_all();
        self.active = false;
        let run = self.run.as_mut()?;
        run.finished_at = Some(io.now);
        run.end = Some(RunEnd::Completed);

        let summary = self.game.summarize(run);
        if let Some(best) = self.game.final_best(&summary) {
            commit_best(io.store, key, &best, &mut self.warnings);
        }
        let report = RunReport {
            game: key,
            summary,
            trials: run.records(),
            started_at_ns: run.started_at,
            finished_at_ns: io.now,
        };
        self.game.halt();
        info!(game = %key, trials = report.trials.len(), "run completed");

        if let Err(e) = io.sink.on_result(&report) {
            warn!(game = %key, error = %e, "result not recorded");
            self.warnings.push(format!("result not recorded: {e}"));
        }
        Some(report)
    }
}

/// Object-safe view of a session, so the engine and the driver can handle
/// every game alike.
pub trait Controller {
    fn key(&self) -> GameKey;
    fn is_active(&self) -> bool;
    fn phase_label(&self) -> &'static str;
    fn start(&mut self, io: &mut Io<'_>) -> bool;
    fn respond(&mut self, input: Input, io: &mut Io<'_>) -> Option<RunReport>;
    fn update(&mut self, io: &mut Io<'_>) -> Option<RunReport>;
    fn stop(&mut self, io: &mut Io<'_>) -> bool;
    fn reset(&mut self, io: &mut Io<'_>);
    fn next_deadline(&self) -> Option<u64>;
    fn display(&self) -> Option<&Display>;
    fn display_revision(&self) -> u64;
    fn status_line(&self, store: &dyn BestScoreStore) -> String;
}

impl<G: Game> Controller for Session<G> {
    fn key(&self) -> GameKey {
        self.game.key()
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn phase_label(&self) -> &'static str {
        self.game.phase().label()
    }

    fn start(&mut self, io: &mut Io<'_>) -> bool {
        Session::start(self, io)
    }

    fn respond(&mut self, input: Input, io: &mut Io<'_>) -> Option<RunReport> {
        Session::respond(self, input, io)
    }

    fn update(&mut self, io: &mut Io<'_>) -> Option<RunReport> {
        Session::update(self, io)
    }

    fn stop(&mut self, io: &mut Io<'_>) -> bool {
        Session::stop(self, io)
    }

    fn reset(&mut self, io: &mut Io<'_>) {
        Session::reset(self, io)
    }

    fn next_deadline(&self) -> Option<u64> {
        Session::next_deadline(self)
    }

    fn display(&self) -> Option<&Display> {
        Session::display(self)
    }

    fn display_revision(&self) -> u64 {
        Session::display_revision(self)
    }

    fn status_line(&self, store: &dyn BestScoreStore) -> String {
        Session::status_line(self, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, StoreError};
    use crate::report::CollectingSink;
    use crate::store::MemoryStore;
    use crate::surface::RecordingSurface;
    use cogex_core::{Detection, DetectionTally, Outcome, Signal, TrialPhase};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MS: u64 = 1_000_000;

    /// Two go signals, 100 ms apart, each open for 50 ms.
    #[derive(Default)]
    struct Probe {
        phase: TrialPhase,
        halted: usize,
        resets: usize,
    }

    impl Game for Probe {
        type Stimulus = Signal;
        type Outcome = Detection;
        type Timer = ();
        type Phase = TrialPhase;

        fn key(&self) -> GameKey {
            GameKey::GoNoGo
        }

        fn plan(&self) -> TrialPlan {
            TrialPlan {
                window: ResponseWindow::Bounded { ms: 50 },
                termination: Termination::FixedCount(2),
            }
        }

        fn phase(&self) -> TrialPhase {
            self.phase
        }

        fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
            self.phase = TrialPhase::Interval;
            cx.schedule(100, ());
        }

        fn on_timer(&mut self, _: (), cx: &mut RunContext<'_, '_, Self>) {
            if cx.present(Signal::Go).is_some() {
                self.phase = TrialPhase::Stimulus;
                cx.show(Display::Signal {
                    signal: Signal::Go,
                    trial: cx.presented(),
                    of: 2,
                });
            }
        }

        fn on_input(&mut self, _: Input, cx: &mut RunContext<'_, '_, Self>) {
            if let Some((index, _)) = cx.pending() {
                cx.classify(index, Detection::Hit, true);
            }
        }

        fn on_window_closed(&mut self, _: usize, cx: &mut RunContext<'_, '_, Self>) {
            self.phase = TrialPhase::Interval;
            cx.schedule(100, ());
        }

        fn on_silence(_: &Signal) -> Option<Detection> {
            Some(Detection::Miss)
        }

        fn summarize(&self, run: &GameRun<Self>) -> RunSummary {
            let tally = run.tally();
            RunSummary::GoNoGo {
                accuracy_pct: tally.accuracy_pct(),
                tally,
            }
        }

        fn final_best(&self, summary: &RunSummary) -> Option<BestScore> {
            summary.accuracy_pct().map(|pct| BestScore::Accuracy { pct })
        }

        fn status(&self, run: Option<&GameRun<Self>>, _: Option<&BestScore>) -> String {
            format!("{} presented", run.map_or(0, |r| r.presented()))
        }

        fn halt(&mut self) {
            self.phase = TrialPhase::Idle;
            self.halted += 1;
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    struct Rig {
        rng: StdRng,
        surface: RecordingSurface,
        sink: CollectingSink,
        store: MemoryStore,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                rng: StdRng::seed_from_u64(3),
                surface: RecordingSurface::new(),
                sink: CollectingSink::new(),
                store: MemoryStore::new(),
            }
        }

        fn io(&mut self, now_ms: u64) -> Io<'_> {
            Io {
                now: now_ms * MS,
                rng: &mut self.rng,
                surface: &mut self.surface,
                sink: &mut self.sink,
                store: &self.store,
            }
        }
    }

    #[test]
    fn bounded_windows_and_fixed_count() {
        let mut rig = Rig::new();
        let mut session = Session::new(Probe::default());
        assert!(session.start(&mut rig.io(0)));
        assert!(!session.start(&mut rig.io(1)));

        // Input before the first stimulus is gated by the phase.
        assert!(session.respond(Input::Press, &mut rig.io(10)).is_none());
        assert_eq!(session.run().unwrap().presented(), 0);

        assert!(session.update(&mut rig.io(100)).is_none());
        assert_eq!(session.next_deadline(), Some(150 * MS));
        session.respond(Input::Press, &mut rig.io(120));
        session.respond(Input::Press, &mut rig.io(130));
        assert_eq!(session.run().unwrap().classified(), 1);

        session.update(&mut rig.io(150));
        session.update(&mut rig.io(250));
        let report = session.update(&mut rig.io(300)).expect("second window closes the run");

        assert!(!session.is_active());
        assert_eq!(
            report.summary,
            RunSummary::GoNoGo {
                accuracy_pct: 50,
                tally: DetectionTally {
                    hits: 1,
                    misses: 1,
                    ..Default::default()
                },
            }
        );
        assert_eq!(report.trials[0].latency_ms, Some(20));
        assert_eq!(report.trials[1].latency_ms, None);
        assert_eq!(rig.sink.len(), 1);
        assert_eq!(rig.store.read(GameKey::GoNoGo).unwrap(), Some(BestScore::Accuracy { pct: 50 }));
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.game().halted, 1);
    }

    #[test]
    fn stop_discards_the_run() {
        let mut rig = Rig::new();
        let mut session = Session::new(Probe::default());
        assert!(!session.stop(&mut rig.io(0)));

        session.start(&mut rig.io(0));
        session.update(&mut rig.io(100));
        assert!(session.stop(&mut rig.io(110)));
        assert_eq!(session.next_deadline(), None);
        assert!(session.update(&mut rig.io(1_000)).is_none());
        assert_eq!(session.run().unwrap().end, Some(RunEnd::Aborted));
        assert!(rig.sink.is_empty());

        session.reset(&mut rig.io(1_000));
        assert!(session.run().is_none());
        assert!(session.display().is_none());
        assert_eq!(session.game().resets, 1);
        assert_eq!(rig.surface.last_status(), None);
    }

    struct BrokenSink;

    impl ResultSink for BrokenSink {
        fn on_result(&mut self, _: &RunReport) -> Result<(), ReportError> {
            Err(ReportError::Rejected("offline".into()))
        }
    }

    struct BrokenStore;

    impl BestScoreStore for BrokenStore {
        fn read(&self, _: GameKey) -> Result<Option<BestScore>, StoreError> {
            Ok(None)
        }

        fn write(&self, _: GameKey, _: &BestScore) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }

        fn compare_and_set(&self, _: GameKey, _: &BestScore) -> Result<bool, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    #[test]
    fn persistence_failures_become_warnings() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut surface = RecordingSurface::new();
        let mut sink = BrokenSink;
        let store = BrokenStore;
        let mut session = Session::new(Probe::default());

        for now_ms in [0u64, 100, 150, 250, 300] {
            let mut io = Io {
                now: now_ms * MS,
                rng: &mut rng,
                surface: &mut surface,
                sink: &mut sink,
                store: &store,
            };
            if now_ms == 0 {
                session.start(&mut io);
            } else {
                session.update(&mut io);
            }
        }

        assert!(!session.is_active());
        assert_eq!(session.warnings().len(), 2);
        let status = surface.last_status().unwrap();
        assert!(status.starts_with("2 presented"));
        assert!(status.contains("warning: best score not saved"));
        assert!(status.contains("warning: result not recorded"));
    }

    #[test]
    fn silence_resolution_is_outcome_specific() {
        assert_eq!(Probe::on_silence(&Signal::Go), Some(Detection::Miss));
        assert!(!Detection::Miss.is_correct());
    }
}
