//! The six timed games, each a [`Game`](crate::session::Game) driven by a
//! [`Session`](crate::session::Session).

pub mod gonogo;
pub mod grid;
pub mod nback;
pub mod reaction;
pub mod simon;
pub mod stroop;

pub use gonogo::GoNoGoGame;
pub use grid::MemoryGridGame;
pub use nback::{NBackGame, NBackItem};
pub use reaction::ReactionGame;
pub use simon::SimonGame;
pub use stroop::StroopGame;
