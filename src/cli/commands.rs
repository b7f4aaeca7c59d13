//! Command definitions for the moodmate CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// moodmate - calm timers for your terminal
#[derive(Parser, Debug)]
#[command(
    name = "moodmate",
    version,
    about = "Guided meditation and walk tracking in the terminal",
    long_about = "A small wellness companion.\n\
                  Run a guided meditation countdown with looping audio, or track \
                  your walks and keep a lifetime walking total.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding persisted values (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a guided meditation countdown
    Meditate(MeditateArgs),

    /// Track a walk interactively
    Walk,

    /// Show the lifetime walking total
    WalkTotal,

    /// Clear the lifetime walking total
    WalkReset,

    /// Print a walking tip
    Tip,

    /// Play the calm music playlist
    Music {
        /// Play without sound output
        #[arg(long)]
        no_sound: bool,
    },

    /// Show the color theme, or flip it with --toggle
    Theme {
        /// Switch between dark and light
        #[arg(long)]
        toggle: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Meditate Command Arguments
// ============================================================================

/// Arguments for the meditate command
#[derive(Args, Debug, Clone, Default)]
pub struct MeditateArgs {
    /// Meditation length in minutes (1-60); defaults to the configured length
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub minutes: Option<u32>,

    /// Audio file to loop while meditating
    #[arg(short, long, value_name = "PATH")]
    pub track: Option<PathBuf>,

    /// Meditate in silence
    #[arg(long)]
    pub no_sound: bool,
}

// ============================================================================
// Tests
// ============================================================================
