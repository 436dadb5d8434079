use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cogex_core::GameKey;
use cogex_experiment::Skill;
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod app;
mod console;

use app::App;

#[derive(Parser)]
#[command(name = "cogex", version, about = "Timed cognitive tasks and an entry battery")]
struct Cli {
    /// TOML engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding best scores and results
    #[arg(long, global = true, env = "COGEX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game with a simulated participant
    Play {
        game: GameKey,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = SkillArg::Typical)]
        skill: SkillArg,
        /// Run on the wall clock instead of a virtual one
        #[arg(long)]
        realtime: bool,
        /// Print every frame shown
        #[arg(long)]
        frames: bool,
    },
    /// Run the entry battery and print the composite score
    Battery {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = SkillArg::Typical)]
        skill: SkillArg,
        #[arg(long)]
        json: bool,
    },
    /// Show stored best scores
    Best { game: Option<GameKey> },
    /// Score a battery from raw measurements
    Score {
        #[arg(long)]
        reaction_ms: Option<f64>,
        #[arg(long)]
        stroop: Option<f64>,
        #[arg(long)]
        nback: Option<f64>,
        #[arg(long)]
        memory: Option<u32>,
    },
    /// Paced breathing: inhale, hold, exhale
    Breathe {
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        #[arg(long, default_value_t = 3)]
        cycles: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SkillArg {
    Novice,
    Typical,
    Expert,
}

impl From<SkillArg> for Skill {
    fn from(arg: SkillArg) -> Self {
        match arg {
            SkillArg::Novice => Skill::novice(),
            SkillArg::Typical => Skill::typical(),
            SkillArg::Expert => Skill::expert(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str())),
        )
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config.as_deref(), cli.data_dir)?;
    match cli.command {
        Commands::Play {
            game,
            seed,
            skill,
            realtime,
            frames,
        } => app.play(game, seed, skill.into(), realtime, frames),
        Commands::Battery { seed, skill, json } => app.battery(seed, skill.into(), json),
        Commands::Best { game } => app.best(game),
        Commands::Score {
            reaction_ms,
            stroop,
            nback,
            memory,
        } => {
            app.score(reaction_ms, stroop, nback, memory);
            Ok(())
        }
        Commands::Breathe { speed, cycles } => app.breathe(speed, cycles),
    }
}
