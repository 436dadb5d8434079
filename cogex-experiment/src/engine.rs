//! One engine, one surface, six games. At most one run is active at a time.

use std::sync::Arc;

use cogex_core::{BestScore, ConfigError, GameKey, RunReport};
use cogex_timing::Timer;
use rand::RngCore;
use tracing::{debug, info};

use crate::battery::{BatteryReport, run_battery};
use crate::config::{EngineConfig, GridConfig};
use crate::driver::{DriveOutcome, Rig, drive};
use crate::error::{EngineError, StoreError};
use crate::games::{GoNoGoGame, MemoryGridGame, NBackGame, ReactionGame, SimonGame, StroopGame};
use crate::participant::Participant;
use crate::report::{LogSink, ResultSink};
use crate::session::{Controller, Io, Session};
use crate::store::BestScoreStore;
use crate::surface::{Display, Input, NullSurface, Surface};

/// Borrows the session for `$key` as a `Controller`, leaving the engine's
/// other fields free for an `Io`.
macro_rules! session_mut {
    ($engine:expr, $key:expr) => {
        match $key {
            GameKey::Reaction => &mut $engine.reaction as &mut dyn Controller,
            GameKey::Stroop => &mut $engine.stroop as &mut dyn Controller,
            GameKey::NBack => &mut $engine.nback as &mut dyn Controller,
            GameKey::GoNoGo => &mut $engine.gonogo as &mut dyn Controller,
            GameKey::Simon => &mut $engine.simon as &mut dyn Controller,
            GameKey::MemoryGrid => &mut $engine.grid as &mut dyn Controller,
        }
    };
}

macro_rules! io {
    ($engine:expr) => {
        Io {
            now: $engine.timer.now(),
            rng: &mut $engine.rng,
            surface: $engine.surface.as_mut(),
            sink: $engine.sink.as_mut(),
            store: $engine.store.as_ref(),
        }
    };
}

pub struct Engine<T: Timer<Timestamp = u64>, R: RngCore> {
    timer: T,
    rng: R,
    config: EngineConfig,
    surface: Box<dyn Surface>,
    sink: Box<dyn ResultSink>,
    store: Arc<dyn BestScoreStore>,
    current: Option<GameKey>,
    reaction: Session<ReactionGame>,
    stroop: Session<StroopGame>,
    nback: Session<NBackGame>,
    gonogo: Session<GoNoGoGame>,
    simon: Session<SimonGame>,
    grid: Session<MemoryGridGame>,
}

impl<T: Timer<Timestamp = u64>, R: RngCore> Engine<T, R> {
    pub fn new(
        config: EngineConfig,
        timer: T,
        rng: R,
        store: Arc<dyn BestScoreStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reaction: Session::new(ReactionGame::new(config.reaction.clone())),
            stroop: Session::new(StroopGame::new(config.stroop.clone())),
            nback: Session::new(NBackGame::new(config.nback.clone())),
            gonogo: Session::new(GoNoGoGame::new(config.gonogo.clone())),
            simon: Session::new(SimonGame::new(config.simon.clone())),
            grid: Session::new(MemoryGridGame::new(config.grid.clone())),
            timer,
            rng,
            config,
            surface: Box::new(NullSurface),
            sink: Box::new(LogSink),
            store,
            current: None,
        })
    }

    pub fn with_surface(mut self, surface: impl Surface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    pub fn with_sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn store(&self) -> &Arc<dyn BestScoreStore> {
        &self.store
    }

    fn session(&self, key: GameKey) -> &dyn Controller {
        match key {
            GameKey::Reaction => &self.reaction,
            GameKey::Stroop => &self.stroop,
            GameKey::NBack => &self.nback,
            GameKey::GoNoGo => &self.gonogo,
            GameKey::Simon => &self.simon,
            GameKey::MemoryGrid => &self.grid,
        }
    }

    /// The game on the surface: the running one, or the last one run.
    pub fn current_game(&self) -> Option<GameKey> {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.current
            .is_some_and(|key| self.session(key).is_active())
    }

    /// Starts `key`. A no-op returning false while any run is active.
    pub fn start(&mut self, key: GameKey) -> bool {
        if self.is_running() {
            debug!(requested = %key, active = ?self.current, "start ignored: engine busy");
            return false;
        }
        self.current = Some(key);
        let session = session_mut!(self, key);
        session.start(&mut io!(self))
    }

    pub fn respond(&mut self, input: Input) -> Option<RunReport> {
        let Some(key) = self.current else {
            debug!(?input, "input dropped: nothing started");
            return None;
        };
        let session = session_mut!(self, key);
        session.respond(input, &mut io!(self))
    }

    /// Fires due timers of the current run.
    pub fn update(&mut self) -> Option<RunReport> {
        let key = self.current?;
        let session = session_mut!(self, key);
        session.update(&mut io!(self))
    }

    pub fn stop(&mut self) -> bool {
        let Some(key) = self.current else {
            return false;
        };
        let session = session_mut!(self, key);
        session.stop(&mut io!(self))
    }

    /// Stops the current game and clears its run state, frame and status
    /// line. Best scores are kept.
    pub fn reset(&mut self) {
        match self.current {
            Some(key) => {
                let session = session_mut!(self, key);
                session.reset(&mut io!(self));
            }
            None => self.surface.clear(),
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.current
            .and_then(|key| self.session(key).next_deadline())
    }

    pub fn display(&self) -> Option<&Display> {
        self.current.and_then(|key| self.session(key).display())
    }

    pub fn status_line(&self) -> String {
        match self.current {
            Some(key) => self.session(key).status_line(self.store.as_ref()),
            None => String::new(),
        }
    }

    pub fn status_line_for(&self, key: GameKey) -> String {
        self.session(key).status_line(self.store.as_ref())
    }

    /// Changes the memory grid side. An unsupported side changes nothing;
    /// otherwise any grid run is stopped and grid progress reset.
    pub fn set_grid_side(&mut self, side: usize) -> Result<(), ConfigError> {
        GridConfig::check_side(side)?;
        if self.current == Some(GameKey::MemoryGrid) {
            let mut io = io!(self);
            self.grid.reset(&mut io);
        }
        self.grid.game_mut().set_side(side)?;
        self.config.grid.side = side;
        info!(side, "grid side changed");
        Ok(())
    }

    pub fn best(&self, key: GameKey) -> Result<Option<BestScore>, StoreError> {
        self.store.read(key)
    }

    /// Plays one full run of `key` with `participant`, driving the timer.
    pub fn play(
        &mut self,
        key: GameKey,
        participant: &mut dyn Participant,
        timeout_ms: u64,
    ) -> Result<Option<RunReport>, EngineError> {
        if self.is_running() {
            return Err(EngineError::Busy);
        }
        self.current = Some(key);
        let session = session_mut!(self, key);
        let mut rig = Rig {
            timer: &self.timer,
            rng: &mut self.rng,
            surface: self.surface.as_mut(),
            sink: self.sink.as_mut(),
            store: self.store.as_ref(),
        };
        match drive(session, &mut rig, participant, timeout_ms) {
            DriveOutcome::Completed(report) => Ok(Some(report)),
            DriveOutcome::Busy => Err(EngineError::Busy),
            DriveOutcome::Stalled | DriveOutcome::TimedOut => Ok(None),
        }
    }

    /// Runs the entry battery on fresh, abbreviated game instances.
    pub fn run_battery(&mut self, participant: &mut dyn Participant) -> Result<BatteryReport, EngineError> {
        if self.is_running() {
            return Err(EngineError::Busy);
        }
        let mut rig = Rig {
            timer: &self.timer,
            rng: &mut self.rng,
            surface: self.surface.as_mut(),
            sink: self.sink.as_mut(),
            store: self.store.as_ref(),
        };
        Ok(run_battery(&self.config, &mut rig, participant))
    }
}
