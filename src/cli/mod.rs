//! CLI module for moodmate.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `runner`: Interactive meditation, walk and music loops

pub mod commands;
pub mod display;
pub mod runner;

pub use commands::{Cli, Commands, MeditateArgs};
pub use display::Display;
pub use runner::{run_meditation, run_music, run_walk, MeditationOutcome};
