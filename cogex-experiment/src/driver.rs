//! Runs a session to completion against a participant, advancing the timer
//! from one event to the next.

use std::fmt;
use std::time::Duration;

use cogex_core::RunReport;
use cogex_timing::{Timer, ms_to_ns};
use rand::RngCore;
use tracing::{debug, warn};

use crate::participant::{Participant, Planned};
use crate::report::ResultSink;
use crate::session::{Controller, Io};
use crate::store::BestScoreStore;
use crate::surface::Surface;

/// Everything a session needs besides itself, with a clock.
pub struct Rig<'a, T> {
    pub timer: &'a T,
    pub rng: &'a mut dyn RngCore,
    pub surface: &'a mut dyn Surface,
    pub sink: &'a mut dyn ResultSink,
    pub store: &'a dyn BestScoreStore,
}

impl<T: Timer<Timestamp = u64>> Rig<'_, T> {
    pub fn now(&self) -> u64 {
        self.timer.now()
    }

    /// Collaborators for one session call, stamped with the current time.
    pub fn io(&mut self) -> Io<'_> {
        Io {
            now: self.timer.now(),
            rng: &mut *self.rng,
            surface: &mut *self.surface,
            sink: &mut *self.sink,
            store: self.store,
        }
    }
}

#[derive(Debug)]
pub enum DriveOutcome {
    Completed(RunReport),
    /// Nothing scheduled and nothing planned; the run was stopped.
    Stalled,
    /// The time limit passed first; the run was stopped.
    TimedOut,
    /// Another run was already active.
    Busy,
}

impl DriveOutcome {
    pub fn into_report(self) -> Option<RunReport> {
        match self {
            DriveOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

impl fmt::Display for DriveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveOutcome::Completed(report) => write!(f, "{} completed", report.game),
            DriveOutcome::Stalled => f.write_str("stalled"),
            DriveOutcome::TimedOut => f.write_str("timed out"),
            DriveOutcome::Busy => f.write_str("busy"),
        }
    }
}

pub fn drive<T: Timer<Timestamp = u64>>(
    session: &mut dyn Controller,
    rig: &mut Rig<'_, T>,
    participant: &mut dyn Participant,
    timeout_ms: u64,
) -> DriveOutcome {
    let key = session.key();
    let deadline = rig.now().saturating_add(ms_to_ns(timeout_ms));
    if !session.start(&mut rig.io()) {
        return DriveOutcome::Busy;
    }

    let mut seen = None;
    let mut planned: Vec<Planned> = Vec::new();
    loop {
        if !session.is_active() {
            return DriveOutcome::Stalled;
        }

        let revision = session.display_revision();
        if seen != Some(revision) {
            seen = Some(revision);
            if let Some(display) = session.display() {
                planned.extend(participant.observe(display, rig.now()));
                planned.sort_by_key(|p| p.at);
            }
        }

        let next = match (session.next_deadline(), planned.first().map(|p| p.at)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(t), None) | (None, Some(t)) => t,
            (None, None) => {
                warn!(game = %key, phase = session.phase_label(), "run stalled, stopping");
                session.stop(&mut rig.io());
                return DriveOutcome::Stalled;
            }
        };
        if next > deadline {
            warn!(game = %key, timeout_ms, "run timed out, stopping");
            session.stop(&mut rig.io());
            return DriveOutcome::TimedOut;
        }

        let now = rig.now();
        if next > now {
            rig.timer.sleep(Duration::from_nanos(next - now));
        }

        if let Some(report) = session.update(&mut rig.io()) {
            return DriveOutcome::Completed(report);
        }
        let now = rig.now();
        while planned.first().is_some_and(|p| p.at <= now) {
            let input = planned.remove(0).input;
            debug!(game = %key, ?input, "participant input");
            if let Some(report) = session.respond(input, &mut rig.io()) {
                return DriveOutcome::Completed(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReactionConfig, StroopConfig};
    use crate::games::{ReactionGame, StroopGame};
    use crate::participant::{SimulatedParticipant, Skill};
    use crate::report::CollectingSink;
    use crate::session::Session;
    use crate::store::MemoryStore;
    use crate::surface::{Display, NullSurface};
    use cogex_timing::ManualTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Silent;

    impl Participant for Silent {
        fn observe(&mut self, _: &Display, _: u64) -> Vec<Planned> {
            Vec::new()
        }
    }

    #[test]
    fn simulated_participant_finishes_reaction_run() {
        let timer = ManualTimer::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut surface = NullSurface;
        let mut sink = CollectingSink::new();
        let store = MemoryStore::new();
        let mut rig = Rig {
            timer: &timer,
            rng: &mut rng,
            surface: &mut surface,
            sink: &mut sink,
            store: &store,
        };
        let skill = Skill {
            mean_latency_ms: 300,
            jitter_ms: 0,
            ..Skill::default()
        };
        let mut participant = SimulatedParticipant::new(2, skill);
        let mut session = Session::new(ReactionGame::new(ReactionConfig::default()));

        let report = drive(&mut session, &mut rig, &mut participant, 10_000)
            .into_report()
            .unwrap();
        assert_eq!(report.summary.latency_ms(), Some(300));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn silent_participant_stalls_stroop() {
        let timer = ManualTimer::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut surface = NullSurface;
        let mut sink = CollectingSink::new();
        let store = MemoryStore::new();
        let mut rig = Rig {
            timer: &timer,
            rng: &mut rng,
            surface: &mut surface,
            sink: &mut sink,
            store: &store,
        };
        let mut session = Session::new(StroopGame::new(StroopConfig::default()));
        let outcome = drive(&mut session, &mut rig, &mut Silent, 10_000);
        assert!(matches!(outcome, DriveOutcome::Stalled));
        assert!(!session.is_active());
        assert!(sink.is_empty());
    }

    #[test]
    fn reaction_cue_beyond_timeout_times_out() {
        let timer = ManualTimer::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut surface = NullSurface;
        let mut sink = CollectingSink::new();
        let store = MemoryStore::new();
        let mut rig = Rig {
            timer: &timer,
            rng: &mut rng,
            surface: &mut surface,
            sink: &mut sink,
            store: &store,
        };
        let mut session = Session::new(ReactionGame::new(ReactionConfig::default()));
        let outcome = drive(&mut session, &mut rig, &mut Silent, 500);
        assert!(matches!(outcome, DriveOutcome::TimedOut));
        assert!(matches!(
            session.run().map(|r| r.end),
            Some(Some(cogex_core::RunEnd::Aborted))
        ));
    }
}
