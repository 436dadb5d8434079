//! The exclusive display/input surface a run draws on.

use std::sync::{Arc, Mutex, MutexGuard};

use cogex_core::{ColorWord, InkColor, Letter, Pad, ReactionCue, Signal};
use serde::{Deserialize, Serialize};

/// What the surface should currently show. `trial` counters are 1-based;
/// letter and cell indices are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Display {
    Blank,
    Prompt { text: String },
    Reaction { cue: ReactionCue },
    ColorWord { stimulus: ColorWord, trial: usize, of: usize },
    Letter { letter: Letter, index: usize },
    Signal { signal: Signal, trial: usize, of: usize },
    Pads { lit: Option<Pad>, accepting: bool },
    Grid {
        side: usize,
        lit: Vec<usize>,
        selected: Vec<usize>,
        accepting: bool,
    },
}

impl Display {
    pub fn prompt(text: impl Into<String>) -> Self {
        Display::Prompt { text: text.into() }
    }
}

/// A participant action delivered to the active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Input {
    /// Generic press: reaction click, N-back "match", Go/No-Go press.
    Press,
    Color(InkColor),
    Pad(Pad),
    Cell(usize),
}

pub trait Surface {
    fn show(&mut self, display: &Display);
    fn status(&mut self, line: &str);
    fn clear(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn show(&mut self, _display: &Display) {}
    fn status(&mut self, _line: &str) {}
    fn clear(&mut self) {}
}

#[derive(Debug, Default)]
struct Recorded {
    frames: Vec<Display>,
    status: Option<String>,
    clears: usize,
}

/// Keeps everything shown. Clones share the same recording, so a test can
/// hand one clone to the engine and inspect the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn frames(&self) -> Vec<Display> {
        self.lock().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Display> {
        self.lock().frames.last().cloned()
    }

    pub fn last_status(&self) -> Option<String> {
        self.lock().status.clone()
    }

    pub fn clears(&self) -> usize {
        self.lock().clears
    }
}

impl Surface for RecordingSurface {
    fn show(&mut self, display: &Display) {
        self.lock().frames.push(display.clone());
    }

    fn status(&mut self, line: &str) {
        self.lock().status = Some(line.to_string());
    }

    fn clear(&mut self) {
        let mut rec = self.lock();
        rec.status = None;
        rec.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_clones_share_state() {
        let probe = RecordingSurface::new();
        let mut surface: Box<dyn Surface> = Box::new(probe.clone());
        surface.show(&Display::prompt("Press start"));
        surface.status("Best: none");
        assert_eq!(probe.frames().len(), 1);
        assert_eq!(probe.last_status().as_deref(), Some("Best: none"));
        surface.clear();
        assert_eq!(probe.last_status(), None);
        assert_eq!(probe.clears(), 1);
    }

    #[test]
    fn display_serializes_tagged() {
        let json = serde_json::to_value(Display::Pads {
            lit: Some(Pad::Red),
            accepting: false,
        })
        .unwrap();
        assert_eq!(json["kind"], "pads");
        assert_eq!(json["lit"], "red");
    }
}
