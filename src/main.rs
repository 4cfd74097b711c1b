mod app;
mod config;
mod dialogue;
mod input;
mod model;
mod render;
mod session;
mod speech;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Chat with a virtual pet that remembers you.
#[derive(Parser, Debug)]
#[command(name = "petpal", version, about)]
struct Cli {
    /// Directory holding the pet, settings, photos and log
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Seed for reply selection, for reproducible conversations
    #[arg(long)]
    seed: Option<u64>,

    /// Don't read replies aloud
    #[arg(long)]
    mute: bool,

    /// Forget the saved pet and start over
    #[arg(long)]
    reset: bool,

    /// Say one thing, print the reply and exit
    #[arg(long, value_name = "TEXT")]
    say: Option<String>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_env("PETPAL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = config::project_paths(cli.data_dir.as_deref())?;
    init_logging(&paths.log_path)?;

    let mut settings = config::load_settings(&paths.settings_path);
    if cli.mute {
        settings.muted = true;
    }

    if cli.reset && paths.store_path.exists() {
        fs::remove_file(&paths.store_path)
            .with_context(|| format!("removing {}", paths.store_path.display()))?;
        tracing::info!("saved pet cleared");
    }

    let mut rng = match cli.seed.or(settings.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Some(text) = cli.say {
        let mut store = storage::JsonFileStore::open(&paths.store_path);
        let ctx = dialogue::TurnContext::now();
        for line in app::one_shot(&mut store, &text, &ctx, &mut rng)? {
            println!("{line}");
        }
        return Ok(());
    }

    tracing::info!(data_dir = %paths.dir.display(), "starting");
    app::run(settings, paths, rng)
}
