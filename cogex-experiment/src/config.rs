//! Engine configuration. Every section falls back to its defaults, so an
//! empty TOML document is a valid configuration.

use std::path::Path;

use cogex_core::ConfigError;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const MIN_GRID_SIDE: usize = 3;
pub const MAX_GRID_SIDE: usize = 6;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reaction: ReactionConfig,
    pub stroop: StroopConfig,
    pub nback: NBackConfig,
    pub gonogo: GoNoGoConfig,
    pub simon: SimonConfig,
    pub grid: GridConfig,
    pub battery: BatteryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 800,
            max_delay_ms: 2600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StroopConfig {
    pub trials: usize,
    pub congruent_probability: f64,
}

impl Default for StroopConfig {
    fn default() -> Self {
        Self {
            trials: 20,
            congruent_probability: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NBackConfig {
    pub n: usize,
    pub interval_ms: u64,
    pub target_probability: f64,
    /// Ends the run after this many stimuli; open-ended when absent.
    pub max_stimuli: Option<usize>,
    /// Sequence length from which the best score starts being tracked.
    pub best_min_length: usize,
}

impl Default for NBackConfig {
    fn default() -> Self {
        Self {
            n: 2,
            interval_ms: 2000,
            target_probability: 0.28,
            max_stimuli: None,
            best_min_length: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoNoGoConfig {
    pub trials: usize,
    pub nogo_probability: f64,
    pub stimulus_ms: u64,
    pub isi_ms: u64,
}

impl Default for GoNoGoConfig {
    fn default() -> Self {
        Self {
            trials: 30,
            nogo_probability: 0.3,
            stimulus_ms: 800,
            isi_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimonConfig {
    pub lead_in_ms: u64,
    pub flash_ms: u64,
    pub gap_ms: u64,
    pub max_level: Option<u32>,
}

impl Default for SimonConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: 400,
            flash_ms: 350,
            gap_ms: 200,
            max_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub side: usize,
    pub base_show_ms: u64,
    pub per_level_ms: u64,
    pub max_extra_ms: u64,
    pub max_level: Option<u32>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            side: 4,
            base_show_ms: 1200,
            per_level_ms: 200,
            max_extra_ms: 2000,
            max_level: None,
        }
    }
}

impl GridConfig {
    pub fn check_side(side: usize) -> Result<(), ConfigError> {
        if (MIN_GRID_SIDE..=MAX_GRID_SIDE).contains(&side) {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedGridSide {
                side,
                min: MIN_GRID_SIDE,
                max: MAX_GRID_SIDE,
            })
        }
    }
}

/// Abbreviated settings used by the entry battery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub reaction_trials: usize,
    pub reaction_max_attempts: usize,
    pub stroop_trials: usize,
    pub nback_stimuli: usize,
    pub memory_max_level: u32,
    pub stage_timeout_ms: u64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            reaction_trials: 3,
            reaction_max_attempts: 6,
            stroop_trials: 20,
            nback_stimuli: 15,
            memory_max_level: 10,
            stage_timeout_ms: 300_000,
        }
    }
}

fn probability(key: &str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("{p} is not a probability")))
    }
}

fn positive<T: PartialOrd + Default + std::fmt::Display>(key: &str, v: T) -> Result<(), ConfigError> {
    if v > T::default() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("{v} must be greater than zero")))
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = toml::from_str(text).map_err(|e| EngineError::ConfigLoad {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: EngineConfig = toml::from_str(&text).map_err(|e| EngineError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reaction;
        if r.max_delay_ms < r.min_delay_ms {
            return Err(ConfigError::invalid(
                "reaction.max_delay_ms",
                format!("{} is below min_delay_ms {}", r.max_delay_ms, r.min_delay_ms),
            ));
        }

        positive("stroop.trials", self.stroop.trials)?;
        probability("stroop.congruent_probability", self.stroop.congruent_probability)?;

        positive("nback.n", self.nback.n)?;
        positive("nback.interval_ms", self.nback.interval_ms)?;
        probability("nback.target_probability", self.nback.target_probability)?;
        if let Some(max) = self.nback.max_stimuli {
            positive("nback.max_stimuli", max)?;
        }

        positive("gonogo.trials", self.gonogo.trials)?;
        positive("gonogo.stimulus_ms", self.gonogo.stimulus_ms)?;
        probability("gonogo.nogo_probability", self.gonogo.nogo_probability)?;

        positive("simon.flash_ms", self.simon.flash_ms)?;

        GridConfig::check_side(self.grid.side)?;

        let b = &self.battery;
        positive("battery.reaction_trials", b.reaction_trials)?;
        if b.reaction_max_attempts < b.reaction_trials {
            return Err(ConfigError::invalid(
                "battery.reaction_max_attempts",
                "must be at least reaction_trials",
            ));
        }
        positive("battery.stroop_trials", b.stroop_trials)?;
        positive("battery.nback_stimuli", b.nback_stimuli)?;
        positive("battery.stage_timeout_ms", b.stage_timeout_ms)?;
        Ok(())
    }
}
