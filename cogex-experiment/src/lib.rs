pub mod battery;
pub mod breathing;
pub mod composite;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod games;
pub mod metrics;
pub mod participant;
pub mod report;
pub mod session;
pub mod store;
pub mod surface;
pub mod trial;

pub use battery::{BatteryReport, run_battery};
pub use breathing::{BreathPhase, BreathingPacer};
pub use composite::{BatteryResult, CompositeScore, Level, SubScores};
pub use config::EngineConfig;
pub use driver::{DriveOutcome, Rig, drive};
pub use engine::Engine;
pub use error::{EngineError, ReportError, StoreError};
pub use participant::{Participant, Planned, SimulatedParticipant, Skill};
pub use report::{CollectingSink, FanOutSink, JsonLinesSink, LogSink, ResultSink};
pub use session::{Controller, Game, Io, ResponseWindow, RunContext, Session, Termination, TrialPlan};
pub use store::{BestScoreStore, JsonFileStore, MemoryStore};
pub use surface::{Display, Input, NullSurface, RecordingSurface, Surface};
pub use trial::Run;
