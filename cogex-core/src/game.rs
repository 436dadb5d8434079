use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownGame;
use crate::score::BestRule;

/// Identifies one game of the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKey {
    Reaction,
    Stroop,
    #[serde(rename = "nback")]
    NBack,
    #[serde(rename = "gonogo")]
    GoNoGo,
    Simon,
    #[serde(rename = "memory")]
    MemoryGrid,
}

impl GameKey {
    pub const ALL: [GameKey; 6] = [
        GameKey::Reaction,
        GameKey::Stroop,
        GameKey::NBack,
        GameKey::GoNoGo,
        GameKey::Simon,
        GameKey::MemoryGrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKey::Reaction => "reaction",
            GameKey::Stroop => "stroop",
            GameKey::NBack => "nback",
            GameKey::GoNoGo => "gonogo",
            GameKey::Simon => "simon",
            GameKey::MemoryGrid => "memory",
        }
    }

    /// Fixed durable key of the game's best score.
    pub fn storage_key(&self) -> &'static str {
        match self {
            GameKey::Reaction => "cogex:reaction:best_ms",
            GameKey::Stroop => "cogex:stroop:best",
            GameKey::NBack => "cogex:nback:best_pct",
            GameKey::GoNoGo => "cogex:gonogo:best_pct",
            GameKey::Simon => "cogex:simon:best_level",
            GameKey::MemoryGrid => "cogex:memory:best_level",
        }
    }

    pub fn best_rule(&self) -> BestRule {
        match self {
            GameKey::Reaction => BestRule::LowerLatency,
            GameKey::Stroop => BestRule::AccuracyThenLatency,
            GameKey::NBack | GameKey::GoNoGo => BestRule::HigherAccuracy,
            GameKey::Simon | GameKey::MemoryGrid => BestRule::HigherLevel,
        }
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKey {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        GameKey::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .or(match wanted.as_str() {
                "go-no-go" | "go_no_go" => Some(GameKey::GoNoGo),
                "n-back" | "2back" => Some(GameKey::NBack),
                "grid" | "memory-grid" => Some(GameKey::MemoryGrid),
                _ => None,
            })
            .ok_or_else(|| UnknownGame(s.to_string()))
    }
}
