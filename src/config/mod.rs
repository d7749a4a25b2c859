//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;

use crate::audio::VolumeSettings;
pub use defaults::{
    DEFAULT_TICK_MS, DEFAULT_VOLUME_CEILING, DEFAULT_VOLUME_STEP, MAX_TICK_MS,
    MAX_VOLUME_CEILING, MIN_TICK_MS,
};

/// CLI options for the termctlr dashboard.
#[derive(Debug, Parser, Clone)]
#[command(about = "termctlr terminal dashboard", author, version)]
pub struct AppConfig {
    /// Volume step applied per key press (non-positive falls back to 5)
    #[arg(long, default_value_t = DEFAULT_VOLUME_STEP, allow_negative_numbers = true)]
    pub step: i32,

    /// Ceiling for the microphone volume (non-positive falls back to 100)
    #[arg(
        long = "max-input-volume",
        default_value_t = DEFAULT_VOLUME_CEILING,
        allow_negative_numbers = true
    )]
    pub max_input_volume: i32,

    /// Ceiling for the speaker volume (non-positive falls back to 100)
    #[arg(
        long = "max-output-volume",
        default_value_t = DEFAULT_VOLUME_CEILING,
        allow_negative_numbers = true
    )]
    pub max_output_volume: i32,

    /// PulseAudio/PipeWire control utility
    #[arg(long = "pactl-cmd", env = "TERMCTLR_PACTL", default_value = "pactl")]
    pub pactl_cmd: String,

    /// Dashboard tick interval (milliseconds)
    #[arg(long = "tick-ms", default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,

    /// Print the current volume/mute state as JSON and exit
    #[arg(long, default_value_t = false)]
    pub snapshot: bool,

    /// Print detected audio input/output devices and exit
    #[arg(long = "list-devices", default_value_t = false)]
    pub list_devices: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "TERMCTLR_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "TERMCTLR_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Log how long each pactl call takes
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }

    /// Step and ceilings for the volume facade, with non-positive values defaulted.
    pub fn volume_settings(&self) -> VolumeSettings {
        VolumeSettings::new(self.step, self.max_input_volume, self.max_output_volume)
    }
}
