use anyhow::{Context, Result};
use std::sync::Arc;
use termctlr::audio::{self, PactlBackend, VolumeControl};
use termctlr::config::AppConfig;

pub(crate) fn list_devices() -> Result<()> {
    let (inputs, outputs) = audio::list_devices().context("failed to list audio devices")?;
    print_device_group("input", &inputs);
    print_device_group("output", &outputs);
    Ok(())
}

fn print_device_group(label: &str, names: &[String]) {
    if names.is_empty() {
        println!("No audio {label} devices detected.");
        return;
    }
    println!("Available audio {label} devices:");
    for name in names {
        println!("  - {name}");
    }
}

/// Read the OS volume state once and print it as pretty JSON.
pub(crate) fn print_snapshot(config: &AppConfig) -> Result<()> {
    let backend = PactlBackend::new(config.pactl_cmd.as_str()).with_timings(config.log_timings);
    let control = VolumeControl::new(Arc::new(backend), config.volume_settings());
    let snapshot = control.sync().context("failed to read volume state")?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
