//! polykeys - play the synth from the computer keyboard
//!
//! Run with: cargo run -- --log polykeys.log

mod app;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use polykeys::{config::EngineConfig, io::keyboard::DEFAULT_OCTAVE};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "polykeys", version, about = "Polyphonic terminal keyboard synth")]
struct Args {
    /// Maximum simultaneous voices (overrides the config file)
    #[arg(long)]
    voices: Option<usize>,

    /// Engine configuration in TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file (the terminal belongs to the UI)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Starting octave for the lower keyboard row
    #[arg(long, default_value_t = DEFAULT_OCTAVE)]
    octave: i8,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(path) = &args.log {
        init_logging(path)?;
    }

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(voices) = args.voices {
        config = config.with_max_voices(voices);
    }
    config.validate().wrap_err("invalid engine configuration")?;

    app::run(config, args.octave)
}

fn init_logging(path: &PathBuf) -> EyreResult<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(path: &PathBuf) -> EyreResult<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_toml_str(&text)
        .wrap_err_with(|| format!("failed to load config {}", path.display()))
}
