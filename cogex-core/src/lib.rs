pub mod error;
pub mod game;
pub mod phase;
pub mod score;
pub mod stats;
pub mod stimulus;
pub mod summary;
pub mod trial;

pub use error::{ConfigError, UnknownGame};
pub use game::GameKey;
pub use phase::{GridPhase, Phase, ReactionPhase, SimonPhase, TrialPhase};
pub use score::{BestRule, BestScore};
pub use stimulus::{ColorWord, GridPattern, InkColor, Letter, Pad, ReactionCue, Signal, Stimulus};
pub use summary::{RunEnd, RunReport, RunSummary};
pub use trial::{
    Choice, ChoiceTally, Detection, DetectionTally, Outcome, ReactionOutcome, ReactionTally,
    Trial, TrialRecord,
};
