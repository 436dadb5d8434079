//! Spatial span: memorise the lit cells, then pick them back.

use std::collections::BTreeSet;

use cogex_core::{BestScore, Choice, ConfigError, GameKey, GridPattern, GridPhase, RunSummary};
use rand::RngCore;

use crate::config::GridConfig;
use crate::metrics::StatusLine;
use crate::session::{Game, GameRun, ResponseWindow, RunContext, Termination, TrialPlan};
use crate::surface::{Display, Input};

/// clamp(side + level / 2, 2, side² - 1)
pub fn pattern_size(side: usize, level: u32) -> usize {
    let max = (side * side).saturating_sub(1).max(2);
    (side + level as usize / 2).clamp(2, max)
}

pub fn show_duration_ms(config: &GridConfig, level: u32) -> u64 {
    config.base_show_ms
        + config
            .max_extra_ms
            .min(config.per_level_ms.saturating_mul(u64::from(level)))
}

pub fn random_pattern(rng: &mut dyn RngCore, side: usize, size: usize) -> GridPattern {
    let cells = side * side;
    let size = size.min(cells);
    GridPattern {
        side,
        cells: rand::seq::index::sample(rng, cells, size).into_iter().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridTimer {
    Hide,
}

#[derive(Debug, Clone)]
pub struct MemoryGridGame {
    config: GridConfig,
    phase: GridPhase,
    /// Level being played; persists across runs until reset or side change.
    level: u32,
    cleared_this_run: u32,
    pattern: GridPattern,
    selected: BTreeSet<usize>,
}

impl MemoryGridGame {
    pub fn new(config: GridConfig) -> Self {
        let side = config.side;
        Self {
            config,
            phase: GridPhase::Idle,
            level: 1,
            cleared_this_run: 0,
            pattern: GridPattern {
                side,
                cells: BTreeSet::new(),
            },
            selected: BTreeSet::new(),
        }
    }

    pub fn side(&self) -> usize {
        self.config.side
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn level_cleared(&self) -> u32 {
        self.level - 1
    }

    pub fn pattern(&self) -> &GridPattern {
        &self.pattern
    }

    /// Changes the grid side and resets progress. Unsupported sides leave
    /// everything untouched.
    pub fn set_side(&mut self, side: usize) -> Result<(), ConfigError> {
        GridConfig::check_side(side)?;
        self.config.side = side;
        self.reset();
        Ok(())
    }

    fn show_grid(&self, cx: &mut RunContext<'_, '_, Self>, lit: bool) {
        cx.show(Display::Grid {
            side: self.config.side,
            lit: if lit {
                self.pattern.cells.iter().copied().collect()
            } else {
                Vec::new()
            },
            selected: self.selected.iter().copied().collect(),
            accepting: self.phase == GridPhase::Input,
        });
    }

    fn start_level(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        let side = self.config.side;
        let size = pattern_size(side, self.level);
        self.pattern = random_pattern(cx.rng(), side, size);
        self.selected.clear();
        self.phase = GridPhase::Showing;
        tracing::debug!(level = self.level, size, "grid pattern shown");
        self.show_grid(cx, true);
        cx.schedule(show_duration_ms(&self.config, self.level), GridTimer::Hide);
    }
}

impl Game for MemoryGridGame {
    type Stimulus = GridPattern;
    type Outcome = Choice;
    type Timer = GridTimer;
    type Phase = GridPhase;

    fn key(&self) -> GameKey {
        GameKey::MemoryGrid
    }

    fn plan(&self) -> TrialPlan {
        TrialPlan {
            window: ResponseWindow::Unbounded,
            termination: Termination::FailStops,
        }
    }

    fn phase(&self) -> GridPhase {
        self.phase
    }

    fn begin(&mut self, cx: &mut RunContext<'_, '_, Self>) {
        self.cleared_this_run = 0;
        self.start_level(cx);
    }

    fn on_timer(&mut self, _hide: GridTimer, cx: &mut RunContext<'_, '_, Self>) {
        if self.phase != GridPhase::Showing {
            return;
        }
        self.phase = GridPhase::Input;
        cx.present(self.pattern.clone());
        self.show_grid(cx, false);
    }

    fn on_input(&mut self, input: Input, cx: &mut RunContext<'_, '_, Self>) {
        let Input::Cell(cell) = input else {
            return;
        };
        let side = self.config.side;
        if cell >= side * side {
            tracing::debug!(cell, side, "cell outside the grid dropped");
            return;
        }
        if !self.selected.remove(&cell) {
            self.selected.insert(cell);
        }
        if self.selected.len() < self.pattern.len() {
            self.show_grid(cx, false);
            return;
        }

        let correct = self.selected.iter().all(|c| self.pattern.contains(*c));
        if let Some((index, _)) = cx.pending() {
            cx.classify(index, Choice::from_match(correct), true);
        }
        if !correct {
            self.phase = GridPhase::Failed;
            self.show_grid(cx, true);
            cx.finish();
            return;
        }

        self.level += 1;
        self.cleared_this_run += 1;
        cx.propose_best(BestScore::Level {
            level: self.level_cleared(),
        });
        if self
            .config
            .max_level
            .is_some_and(|max| self.cleared_this_run >= max)
        {
            self.phase = GridPhase::Idle;
            cx.show(Display::prompt("Done"));
            cx.finish();
        } else {
            self.start_level(cx);
        }
    }

    fn summarize(&self, _run: &GameRun<Self>) -> RunSummary {
        RunSummary::MemoryGrid {
            level_cleared: self.level_cleared(),
            grid_side: self.config.side,
            failed: self.phase == GridPhase::Failed,
        }
    }

    fn status(&self, _run: Option<&GameRun<Self>>, best: Option<&BestScore>) -> String {
        let side = self.config.side;
        let mut line = StatusLine::new()
            .text(format!("{side}x{side}"))
            .field("Level", self.level);
        if self.phase == GridPhase::Failed {
            line = line.text("Pattern missed");
        }
        line.best(best).build()
    }

    fn halt(&mut self) {
        if self.phase != GridPhase::Failed {
            self.phase = GridPhase::Idle;
        }
    }

    fn reset(&mut self) {
        self.phase = GridPhase::Idle;
        self.level = 1;
        self.cleared_this_run = 0;
        self.selected.clear();
        self.pattern = GridPattern {
            side: self.config.side,
            cells: BTreeSet::new(),
        };
    }
}
