use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use cogex_core::GameKey;
use cogex_experiment::composite::{self, BatteryResult};
use cogex_experiment::{
    BestScoreStore, BreathingPacer, Engine, EngineConfig, FanOutSink, JsonFileStore,
    JsonLinesSink, LogSink, SimulatedParticipant, Skill,
};
use cogex_timing::{HighPrecisionTimer, ManualTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::console::ConsoleSurface;

const BEST_FILE: &str = "best_scores.json";
const RESULTS_FILE: &str = "results.jsonl";
/// Upper bound on one simulated run, in participant time.
const PLAY_TIMEOUT_MS: u64 = 15 * 60 * 1000;

pub struct App {
    config: EngineConfig,
    data_dir: PathBuf,
}

impl App {
    pub fn new(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_dir()
                .map(|d| d.join("cogex"))
                .ok_or_else(|| anyhow!("no data directory on this platform; pass --data-dir"))?,
        };
        Ok(Self { config, data_dir })
    }

    fn store(&self) -> Result<JsonFileStore> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating {}", self.data_dir.display()))?;
        Ok(JsonFileStore::open(self.data_dir.join(BEST_FILE))?)
    }

    fn engine<T: Timer<Timestamp = u64>>(
        &self,
        timer: T,
        seed: u64,
        frames: bool,
    ) -> Result<Engine<T, StdRng>> {
        let sink = FanOutSink::new()
            .with(LogSink)
            .with(JsonLinesSink::new(self.data_dir.join(RESULTS_FILE)));
        Ok(Engine::new(
            self.config.clone(),
            timer,
            StdRng::seed_from_u64(seed),
            Arc::new(self.store()?),
        )?
        .with_surface(ConsoleSurface::new(frames))
        .with_sink(sink))
    }

    fn participant(seed: u64, skill: Skill, n_back: usize) -> SimulatedParticipant {
        SimulatedParticipant::new(seed.wrapping_add(1), skill).with_n_back(n_back)
    }

    pub fn play(
        &self,
        game: GameKey,
        seed: Option<u64>,
        skill: Skill,
        realtime: bool,
        frames: bool,
    ) -> Result<()> {
        let seed = seed.unwrap_or_else(rand::random);
        info!(%game, seed, realtime, "playing");
        if realtime {
            self.play_on(HighPrecisionTimer::new(), game, seed, skill, frames)
        } else {
            self.play_on(ManualTimer::new(), game, seed, skill, frames)
        }
    }

    fn play_on<T: Timer<Timestamp = u64>>(
        &self,
        timer: T,
        game: GameKey,
        seed: u64,
        skill: Skill,
        frames: bool,
    ) -> Result<()> {
        let mut engine = self.engine(timer, seed, frames)?;
        let mut participant = Self::participant(seed, skill, self.config.nback.n);
        match engine.play(game, &mut participant, PLAY_TIMEOUT_MS)? {
            Some(report) => {
                println!("{}", serde_json::to_string_pretty(&report.summary)?);
            }
            None => println!("{game}: run ended without a result"),
        }
        println!("{}", engine.status_line_for(game));
        Ok(())
    }

    pub fn battery(&self, seed: Option<u64>, skill: Skill, json: bool) -> Result<()> {
        let seed = seed.unwrap_or_else(rand::random);
        let mut engine = self.engine(ManualTimer::new(), seed, false)?;
        let mut participant = Self::participant(seed, skill, self.config.nback.n);
        let report = engine.run_battery(&mut participant)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        let r = &report.results;
        println!("Reaction: {}", fmt_opt(r.reaction_ms_avg, "ms"));
        println!("Stroop:   {}", fmt_opt(r.stroop_acc, "%"));
        println!("N-back:   {}", fmt_opt(r.nback_acc, "%"));
        println!(
            "Memory:   {}",
            r.memory_level.map_or("n/a".to_string(), |l| format!("level {l}"))
        );
        println!("Composite: {} ({})", report.score.composite, report.score.level);
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        Ok(())
    }

    pub fn best(&self, game: Option<GameKey>) -> Result<()> {
        let store = self.store()?;
        let keys = match game {
            Some(key) => vec![key],
            None => GameKey::ALL.to_vec(),
        };
        for key in keys {
            match store.read(key)? {
                Some(best) => println!("{key}: {best}"),
                None => println!("{key}: none"),
            }
        }
        Ok(())
    }

    pub fn score(
        &self,
        reaction_ms: Option<f64>,
        stroop: Option<f64>,
        nback: Option<f64>,
        memory: Option<u32>,
    ) {
        let result = BatteryResult {
            reaction_ms_avg: reaction_ms,
            stroop_acc: stroop,
            nback_acc: nback,
            memory_level: memory,
        };
        let subs = composite::sub_scores(&result);
        let score = composite::score(&result);
        println!(
            "reaction {:.1} • stroop {:.1} • nback {:.1} • memory {:.1}",
            subs.reaction, subs.stroop, subs.nback, subs.memory
        );
        println!("Composite: {} ({})", score.composite, score.level);
    }

    /// Blocks on the wall clock for `cycles` full breaths.
    pub fn breathe(&self, speed: f64, cycles: u32) -> Result<()> {
        let timer = HighPrecisionTimer::new();
        let mut pacer = BreathingPacer::new(speed)?;
        pacer.start(timer.now());
        println!("{}", pacer.phase_label());
        while pacer.cycles() < cycles {
            let Some(due) = pacer.next_transition() else {
                break;
            };
            timer.sleep(Duration::from_nanos(due.saturating_sub(timer.now())));
            if pacer.update(timer.now()).is_some() && pacer.cycles() < cycles {
                println!("{}", pacer.phase_label());
            }
        }
        pacer.stop();
        println!("{}", pacer.phase_label());
        Ok(())
    }
}

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    value.map_or("n/a".to_string(), |v| format!("{v:.1} {unit}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_play_persists_best_and_results() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(None, Some(dir.path().to_path_buf())).unwrap();
        app.play(GameKey::Stroop, Some(4), Skill::expert(), false, false)
            .unwrap();

        let store = JsonFileStore::open(dir.path().join(BEST_FILE)).unwrap();
        assert!(store.read(GameKey::Stroop).unwrap().is_some());
        let results = fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
        assert_eq!(results.lines().count(), 1);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(App::new(Some(&missing), Some(dir.path().to_path_buf())).is_err());
    }
}
