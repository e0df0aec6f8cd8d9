//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Simulated motion shape fed to the engine in place of a real sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MotionPattern {
    /// Never moves; output suspends after the stillness window.
    Still,
    /// Smooth swaying that never stops.
    Sway,
    /// Bursts of movement separated by long pauses.
    Bursts,
}

#[derive(Parser, Debug)]
#[command(name = "flux")]
#[command(about = "Motion-modulated wavetable synth", long_about = None)]
pub struct Args {
    /// JSON engine config; defaults are used for anything omitted
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Run time in seconds
    #[arg(long, value_name = "SECONDS", default_value = "20")]
    pub duration: f32,

    /// Master volume before the safety attenuation (0.0 - 1.0)
    #[arg(long, default_value = "0.75")]
    pub volume: f32,

    /// Oscillator amplitude (0.0 - 1.0)
    #[arg(long, default_value = "0.8")]
    pub amplitude: f32,

    /// Simulated motion pattern
    #[arg(long, value_enum, default_value = "bursts")]
    pub motion: MotionPattern,
}
