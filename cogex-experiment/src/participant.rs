//! Who answers the games. The engine never blocks on input: a participant
//! looks at each new frame and plans timed inputs in response.

use cogex_core::{InkColor, Letter, Pad, ReactionCue, Signal};
use cogex_timing::ms_to_ns;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::surface::{Display, Input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planned {
    pub at: u64,
    pub input: Input,
}

pub trait Participant {
    fn observe(&mut self, display: &Display, now: u64) -> Vec<Planned>;
}

/// Behavioral profile of a simulated participant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub mean_latency_ms: u64,
    pub jitter_ms: u64,
    /// Probability of answering a single item correctly.
    pub accuracy: f64,
    /// Items held in memory for Simon and the grid; later items are guessed.
    pub span: usize,
}

impl Skill {
    pub fn novice() -> Self {
        Self {
            mean_latency_ms: 560,
            jitter_ms: 150,
            accuracy: 0.7,
            span: 4,
        }
    }

    pub fn typical() -> Self {
        Self::default()
    }

    pub fn expert() -> Self {
        Self {
            mean_latency_ms: 320,
            jitter_ms: 60,
            accuracy: 0.97,
            span: 9,
        }
    }
}

impl Default for Skill {
    fn default() -> Self {
        Self {
            mean_latency_ms: 450,
            jitter_ms: 100,
            accuracy: 0.88,
            span: 6,
        }
    }
}

/// Seeded, reproducible participant.
#[derive(Debug, Clone)]
pub struct SimulatedParticipant {
    rng: StdRng,
    skill: Skill,
    n_back: usize,
    letters: Vec<Letter>,
    replay: Vec<Pad>,
    pattern: Vec<usize>,
}

const MIN_LATENCY_MS: u64 = 120;
/// Go/No-Go and N-back answers arrive before this, to stay inside the window.
const MAX_STREAM_LATENCY_MS: u64 = 700;

impl SimulatedParticipant {
    pub fn new(seed: u64, skill: Skill) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            skill: Skill {
                accuracy: skill.accuracy.clamp(0.0, 1.0),
                ..skill
            },
            n_back: 2,
            letters: Vec::new(),
            replay: Vec::new(),
            pattern: Vec::new(),
        }
    }

    pub fn with_n_back(mut self, n: usize) -> Self {
        self.n_back = n;
        self
    }

    pub fn skill(&self) -> &Skill {
        &self.skill
    }

    fn latency_ms(&mut self) -> u64 {
        let Skill {
            mean_latency_ms: mean,
            jitter_ms: jitter,
            ..
        } = self.skill;
        let low = mean.saturating_sub(jitter);
        let value = if jitter == 0 {
            mean
        } else {
            self.rng.random_range(low..=mean + jitter)
        };
        value.max(MIN_LATENCY_MS)
    }

    fn stream_latency_ms(&mut self) -> u64 {
        self.latency_ms().min(MAX_STREAM_LATENCY_MS)
    }

    fn hits(&mut self) -> bool {
        self.rng.random_bool(self.skill.accuracy)
    }

    fn recalls(&mut self, position: usize) -> bool {
        position < self.skill.span && self.rng.random_bool(1.0 - (1.0 - self.skill.accuracy) / 4.0)
    }

    fn press_after(&mut self, now: u64, latency_ms: u64, input: Input) -> Vec<Planned> {
        vec![Planned {
            at: now + ms_to_ns(latency_ms),
            input,
        }]
    }

    fn sequence(&mut self, now: u64, inputs: Vec<Input>) -> Vec<Planned> {
        let mut at = now;
        inputs
            .into_iter()
            .map(|input| {
                at += ms_to_ns(self.latency_ms());
                Planned { at, input }
            })
            .collect()
    }

    fn answer_stroop(&mut self, ink: InkColor, now: u64) -> Vec<Planned> {
        let choice = if self.hits() {
            ink
        } else {
            let others: Vec<InkColor> = InkColor::ALL.into_iter().filter(|c| *c != ink).collect();
            others[self.rng.random_range(0..others.len())]
        };
        let latency = self.latency_ms();
        self.press_after(now, latency, Input::Color(choice))
    }

    fn answer_letter(&mut self, letter: Letter, index: usize, now: u64) -> Vec<Planned> {
        if index == 0 {
            self.letters.clear();
        }
        self.letters.push(letter);
        let n = self.n_back;
        let target = index >= n && self.letters.get(index - n) == Some(&letter);
        let press = if target {
            self.hits()
        } else {
            self.rng.random_bool((1.0 - self.skill.accuracy) / 2.0)
        };
        if !press {
            return Vec::new();
        }
        let latency = self.stream_latency_ms();
        self.press_after(now, latency, Input::Press)
    }

    fn answer_signal(&mut self, signal: Signal, now: u64) -> Vec<Planned> {
        let press = match signal {
            Signal::Go => self.hits(),
            Signal::NoGo => !self.hits(),
        };
        if !press {
            return Vec::new();
        }
        let latency = self.stream_latency_ms();
        self.press_after(now, latency, Input::Press)
    }

    fn answer_pads(&mut self, now: u64) -> Vec<Planned> {
        let replay = std::mem::take(&mut self.replay);
        let inputs: Vec<Input> = replay
            .iter()
            .enumerate()
            .map(|(i, pad)| {
                if self.recalls(i) {
                    Input::Pad(*pad)
                } else {
                    Input::Pad(Pad::ALL[self.rng.random_range(0..Pad::ALL.len())])
                }
            })
            .collect();
        self.sequence(now, inputs)
    }

    fn answer_grid(&mut self, side: usize, now: u64) -> Vec<Planned> {
        let pattern = std::mem::take(&mut self.pattern);
        let cells = side * side;
        let mut chosen: Vec<usize> = Vec::with_capacity(pattern.len());
        for (i, cell) in pattern.iter().enumerate() {
            if self.recalls(i) && !chosen.contains(cell) {
                chosen.push(*cell);
                continue;
            }
            // Guess a cell outside the pattern, or any unchosen one if none is left.
            let mut free: Vec<usize> = (0..cells)
                .filter(|c| !chosen.contains(c) && !pattern.contains(c))
                .collect();
            if free.is_empty() {
                free = (0..cells).filter(|c| !chosen.contains(c)).collect();
            }
            if free.is_empty() {
                break;
            }
            chosen.push(free[self.rng.random_range(0..free.len())]);
        }
        let inputs = chosen.into_iter().map(Input::Cell).collect();
        self.sequence(now, inputs)
    }
}

impl Participant for SimulatedParticipant {
    fn observe(&mut self, display: &Display, now: u64) -> Vec<Planned> {
        match display {
            Display::Reaction {
                cue: ReactionCue::Go,
            } => {
                let latency = self.latency_ms();
                self.press_after(now, latency, Input::Press)
            }
            Display::ColorWord { stimulus, .. } => self.answer_stroop(stimulus.ink, now),
            Display::Letter { letter, index } => self.answer_letter(*letter, *index, now),
            Display::Signal { signal, .. } => self.answer_signal(*signal, now),
            Display::Pads {
                lit: Some(pad),
                accepting: false,
            } => {
                self.replay.push(*pad);
                Vec::new()
            }
            Display::Pads {
                lit: None,
                accepting: true,
            } if !self.replay.is_empty() => self.answer_pads(now),
            Display::Grid {
                lit,
                accepting: false,
                ..
            } if !lit.is_empty() => {
                self.pattern = lit.clone();
                Vec::new()
            }
            Display::Grid {
                side,
                accepting: true,
                selected,
                ..
            } if selected.is_empty() && !self.pattern.is_empty() => self.answer_grid(*side, now),
            _ => Vec::new(),
        }
    }
}
