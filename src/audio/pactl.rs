//! OS volume control through the PulseAudio/PipeWire `pactl` utility.

use super::error::AudioError;
use super::volume::Direction;
use crate::{log_timing, LogSource};
use regex::Regex;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Instant;

/// OS-side volume and mute operations for the default sink/source.
///
/// Every call may block on a subprocess, so callers must not hold locks across it.
pub trait VolumeBackend: Send + Sync {
    fn volume(&self, direction: Direction) -> Result<i32, AudioError>;
    fn muted(&self, direction: Direction) -> Result<bool, AudioError>;
    fn set_volume(&self, direction: Direction, percent: i32) -> Result<(), AudioError>;
    fn set_muted(&self, direction: Direction, muted: bool) -> Result<(), AudioError>;
}

/// Runs `pactl get-*/set-*` for each operation.
#[derive(Debug, Clone)]
pub struct PactlBackend {
    program: String,
    log_timings: bool,
}

impl PactlBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            log_timings: false,
        }
    }

    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.log_timings = enabled;
        self
    }

    fn run(&self, args: &[&str]) -> Result<String, AudioError> {
        let command = format!("{} {}", self.program, args.join(" "));
        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| AudioError::OsCommandFailed {
                command: command.clone(),
                detail: err.to_string(),
            })?;
        if self.log_timings {
            log_timing(LogSource::Pactl, &command, started.elapsed());
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(AudioError::OsCommandFailed { command, detail });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VolumeBackend for PactlBackend {
    fn volume(&self, direction: Direction) -> Result<i32, AudioError> {
        let verb = format!("get-{}-volume", direction.kind());
        let text = self.run(&[&verb, direction.target()])?;
        parse_volume(&verb, &text)
    }

    fn muted(&self, direction: Direction) -> Result<bool, AudioError> {
        let verb = format!("get-{}-mute", direction.kind());
        let text = self.run(&[&verb, direction.target()])?;
        parse_mute(&verb, &text)
    }

    fn set_volume(&self, direction: Direction, percent: i32) -> Result<(), AudioError> {
        let verb = format!("set-{}-volume", direction.kind());
        let value = format!("{percent}%");
        self.run(&[&verb, direction.target(), &value]).map(drop)
    }

    fn set_muted(&self, direction: Direction, muted: bool) -> Result<(), AudioError> {
        let verb = format!("set-{}-mute", direction.kind());
        let value = if muted { "1" } else { "0" };
        self.run(&[&verb, direction.target(), value]).map(drop)
    }
}

/// `pactl subscribe`: one line per audio server event until killed.
pub fn subscribe_command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("subscribe")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    cmd
}

fn percent_regex() -> &'static Regex {
    static PERCENT: OnceLock<Regex> = OnceLock::new();
    PERCENT.get_or_init(|| Regex::new(r"(\d+)%").expect("valid percent regex"))
}

/// First `NN%` in the output; for stereo sinks that is the front-left channel.
pub(crate) fn parse_volume(command: &str, text: &str) -> Result<i32, AudioError> {
    percent_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<i32>().ok())
        .ok_or_else(|| AudioError::ParseFailed {
            command: command.to_string(),
            output: text.trim().to_string(),
        })
}

pub(crate) fn parse_mute(command: &str, text: &str) -> Result<bool, AudioError> {
    if text.contains("yes") {
        Ok(true)
    } else if text.contains("no") {
        Ok(false)
    } else {
        Err(AudioError::ParseFailed {
            command: command.to_string(),
            output: text.trim().to_string(),
        })
    }
}
