use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Defines stimuli and how they are described in result records
pub trait Stimulus: Clone + Send + Sync + std::fmt::Debug {
    fn describe(&self) -> String;
}

/// Stroop palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InkColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl InkColor {
    pub const ALL: [InkColor; 5] = [
        InkColor::Red,
        InkColor::Green,
        InkColor::Blue,
        InkColor::Yellow,
        InkColor::Purple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InkColor::Red => "RED",
            InkColor::Green => "GREEN",
            InkColor::Blue => "BLUE",
            InkColor::Yellow => "YELLOW",
            InkColor::Purple => "PURPLE",
        }
    }
}

/// A color word printed in an ink color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorWord {
    pub word: InkColor,
    pub ink: InkColor,
}

impl ColorWord {
    pub fn is_congruent(&self) -> bool {
        self.word == self.ink
    }
}

impl Stimulus for ColorWord {
    fn describe(&self) -> String {
        format!("{} in {:?}", self.word.name(), self.ink)
    }
}

/// Letters used by the N-back stream (no `I`, `O`, `S`).
pub const LETTERS: &str = "ABCDEFGHJKLMNPQRTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Letter(pub char);

impl Letter {
    pub fn alphabet() -> impl Iterator<Item = Letter> {
        LETTERS.chars().map(Letter)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Stimulus for Letter {
    fn describe(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Go,
    NoGo,
}

impl Stimulus for Signal {
    fn describe(&self) -> String {
        match self {
            Signal::Go => "go".into(),
            Signal::NoGo => "no-go".into(),
        }
    }
}

/// Reaction-time cue. `Wait` is only recorded for premature responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionCue {
    Wait,
    Go,
}

impl Stimulus for ReactionCue {
    fn describe(&self) -> String {
        match self {
            ReactionCue::Wait => "wait".into(),
            ReactionCue::Go => "go".into(),
        }
    }
}

/// Simon pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pad {
    Green,
    Red,
    Blue,
    Yellow,
}

impl Pad {
    pub const ALL: [Pad; 4] = [Pad::Green, Pad::Red, Pad::Blue, Pad::Yellow];
}

impl Stimulus for Pad {
    fn describe(&self) -> String {
        format!("{:?}", self).to_lowercase()
    }
}

/// Cells lit on a square grid, indexed row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPattern {
    pub side: usize,
    pub cells: BTreeSet<usize>,
}

impl GridPattern {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.cells.contains(&cell)
    }
}

impl Stimulus for GridPattern {
    fn describe(&self) -> String {
        let cells: Vec<String> = self.cells.iter().map(|c| c.to_string()).collect();
        format!("{}x{} [{}]", self.side, self.side, cells.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_has_23_distinct_letters() {
        let letters: BTreeSet<char> = Letter::alphabet().map(|l| l.0).collect();
        assert_eq!(letters.len(), 23);
        assert!(!letters.contains(&'I'));
        assert!(!letters.contains(&'O'));
        assert!(!letters.contains(&'S'));
    }

    #[test]
    fn congruence_compares_word_and_ink() {
        let congruent = ColorWord {
            word: InkColor::Red,
            ink: InkColor::Red,
        };
        let incongruent = ColorWord {
            word: InkColor::Red,
            ink: InkColor::Blue,
        };
        assert!(congruent.is_congruent());
        assert!(!incongruent.is_congruent());
        assert_eq!(incongruent.describe(), "RED in Blue");
    }

    #[test]
    fn grid_pattern_describes_cells_in_order() {
        let pattern = GridPattern {
            side: 3,
            cells: [7, 0, 4].into_iter().collect(),
        };
        assert_eq!(pattern.describe(), "3x3 [0,4,7]");
        assert!(pattern.contains(4));
        assert!(!pattern.contains(5));
    }
}
