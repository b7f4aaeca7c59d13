//! moodmate - calm timers for your terminal
//!
//! Two guided activities share one session engine:
//! - a meditation countdown with looping audio
//! - a walk stopwatch that keeps a lifetime walking total

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use rand::seq::SliceRandom;
use tokio::io::BufReader;
use tokio::time::Duration;

use moodmate::app::{
    AudioFactory, MeditationHost, MusicHost, MusicPlaylist, ThemePreference, WalkHost, WALK_TOTAL_KEY,
};
use moodmate::cli::{run_meditation, run_music, run_walk, Cli, Commands, Display, MeditateArgs};
use moodmate::session::{JsonFileStore, PersistentCounter, TokioClock, WALK_TIPS};
use moodmate::sound::{meditation_sound, try_create_audio, AudioOutput, SoundSource};
use moodmate::types::{AppConfig, MeditationConfig};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let config = AppConfig::load_default();
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.resolve_data_dir());
    tracing::debug!("Using data directory {}", data_dir.display());

    match cli.command {
        Some(Commands::Meditate(args)) => meditate(&config, args).await?,
        Some(Commands::Walk) => walk(&config, data_dir).await?,
        Some(Commands::WalkTotal) => {
            let counter = walk_counter(data_dir);
            Display::show_walk_total(counter.load());
        }
        Some(Commands::WalkReset) => {
            let mut counter = walk_counter(data_dir);
            counter.clear();
            Display::show_walk_reset();
        }
        Some(Commands::Tip) => {
            let tip = WALK_TIPS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or_default();
            Display::show_tip(tip);
        }
        Some(Commands::Music { no_sound }) => music(&config, &data_dir, no_sound).await?,
        Some(Commands::Theme { toggle }) => {
            let mut theme = ThemePreference::load(Box::new(JsonFileStore::in_dir(&data_dir)));
            if toggle {
                theme.toggle();
            }
            Display::show_theme(theme.is_dark());
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

async fn meditate(config: &AppConfig, args: MeditateArgs) -> Result<()> {
    let meditation = args
        .minutes
        .map(|minutes| MeditationConfig::clamped(i64::from(minutes)))
        .unwrap_or_else(|| config.meditation());
    let track = args.track.or_else(|| config.meditation_track.clone());
    let source = meditation_sound(track.as_deref());

    Display::show_meditation_start(meditation.minutes, source.name());

    let audio: Option<Box<dyn AudioOutput>> = if args.no_sound || !config.sound_enabled {
        None
    } else {
        try_create_audio(source, false).map(|audio| Box::new(audio) as Box<dyn AudioOutput>)
    };

    let mut host = MeditationHost::new(TokioClock::new(), audio, meditation);
    run_meditation(&mut host, BufReader::new(tokio::io::stdin()))
        .await
        .context("meditation failed")?;
    Ok(())
}

async fn walk(config: &AppConfig, data_dir: PathBuf) -> Result<()> {
    let store = JsonFileStore::in_dir(&data_dir);
    let fade = Duration::from_millis(config.tip_fade_millis);
    let mut host = WalkHost::new(TokioClock::new(), Box::new(store), fade);

    run_walk(&mut host, BufReader::new(tokio::io::stdin()))
        .await
        .context("walk tracker failed")?;
    Ok(())
}

async fn music(config: &AppConfig, data_dir: &Path, no_sound: bool) -> Result<()> {
    let disabled = no_sound || !config.sound_enabled;
    let factory: AudioFactory = Box::new(move |source: &SoundSource| {
        try_create_audio(source.clone(), disabled)
            .map(|audio| Box::new(audio) as Box<dyn AudioOutput>)
    });
    let mut host = MusicHost::new(MusicPlaylist::from_config(config, data_dir), factory);

    run_music(&mut host, BufReader::new(tokio::io::stdin()))
        .await
        .context("music player failed")?;
    Ok(())
}

fn walk_counter(data_dir: PathBuf) -> PersistentCounter {
    PersistentCounter::new(WALK_TOTAL_KEY, Box::new(JsonFileStore::in_dir(&data_dir)))
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
