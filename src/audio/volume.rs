//! Mirrored OS volume/mute state and the single path that mutates it.
//!
//! Every mutation runs in two phases: the external call happens without the mirror lock
//! (it can block on a subprocess), then the lock is taken briefly to commit the result.
//! A failed external call leaves the mirror exactly as it was.

use super::error::AudioError;
use super::pactl::VolumeBackend;
use crate::config::{DEFAULT_VOLUME_CEILING, DEFAULT_VOLUME_STEP};
use crate::lock_or_recover;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Input (microphone, "source") or output (speaker, "sink").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Output, Direction::Input];

    /// pactl object kind.
    pub fn kind(self) -> &'static str {
        match self {
            Direction::Input => "source",
            Direction::Output => "sink",
        }
    }

    /// pactl token for the default device.
    pub fn target(self) -> &'static str {
        match self {
            Direction::Input => "@DEFAULT_SOURCE@",
            Direction::Output => "@DEFAULT_SINK@",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Input => "Mic",
            Direction::Output => "Vol",
        }
    }
}

/// Step and ceilings chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSettings {
    pub step: i32,
    pub max_input: i32,
    pub max_output: i32,
}

impl VolumeSettings {
    /// Non-positive values fall back to a step of 5 and ceilings of 100.
    pub fn new(step: i32, max_input: i32, max_output: i32) -> Self {
        let or_default = |value: i32, default: i32| if value <= 0 { default } else { value };
        Self {
            step: or_default(step, DEFAULT_VOLUME_STEP),
            max_input: or_default(max_input, DEFAULT_VOLUME_CEILING),
            max_output: or_default(max_output, DEFAULT_VOLUME_CEILING),
        }
    }

    fn max_for(&self, direction: Direction) -> i32 {
        match direction {
            Direction::Input => self.max_input,
            Direction::Output => self.max_output,
        }
    }
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_STEP, DEFAULT_VOLUME_CEILING, DEFAULT_VOLUME_CEILING)
    }
}

/// Mirror of one direction's OS state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeState {
    pub current: i32,
    pub max: i32,
    pub muted: bool,
    pub step: i32,
}

impl VolumeState {
    fn new(max: i32, step: i32) -> Self {
        Self {
            current: 0,
            max,
            muted: false,
            step,
        }
    }

    /// Whole bar segments out of `total` covered by `current`. Partial segments are
    /// dropped, so the bar is only full at `current == max`.
    pub fn filled_segments(&self, total: usize) -> usize {
        if self.max <= 0 {
            return 0;
        }
        let current = clamp_volume(self.current, self.max) as usize;
        current * total / self.max as usize
    }
}

/// Copy of both directions taken under the lock, for rendering and `--snapshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeSnapshot {
    pub output: VolumeState,
    pub input: VolumeState,
}

impl VolumeSnapshot {
    pub fn get(&self, direction: Direction) -> &VolumeState {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    fn get_mut(&mut self, direction: Direction) -> &mut VolumeState {
        match direction {
            Direction::Input => &mut self.input,
            Direction::Output => &mut self.output,
        }
    }
}

pub fn clamp_volume(value: i32, max: i32) -> i32 {
    value.clamp(0, max.max(0))
}

/// Sole owner of the mirrored volume/mute state.
pub struct VolumeControl {
    backend: Arc<dyn VolumeBackend>,
    mirror: Mutex<VolumeSnapshot>,
}

impl VolumeControl {
    /// Build with an all-zero mirror; call [`VolumeControl::sync`] to load the OS state.
    pub fn new(backend: Arc<dyn VolumeBackend>, settings: VolumeSettings) -> Self {
        let mirror = VolumeSnapshot {
            output: VolumeState::new(settings.max_for(Direction::Output), settings.step),
            input: VolumeState::new(settings.max_for(Direction::Input), settings.step),
        };
        Self {
            backend,
            mirror: Mutex::new(mirror),
        }
    }

    pub fn snapshot(&self) -> VolumeSnapshot {
        *lock_or_recover(&self.mirror, "VolumeControl::snapshot")
    }

    pub fn state(&self, direction: Direction) -> VolumeState {
        *self.snapshot().get(direction)
    }

    pub fn increment(&self, direction: Direction) -> Result<i32, AudioError> {
        let state = self.state(direction);
        self.set_volume(direction, state.current.saturating_add(state.step))
    }

    pub fn decrement(&self, direction: Direction) -> Result<i32, AudioError> {
        let state = self.state(direction);
        self.set_volume(direction, state.current.saturating_sub(state.step))
    }

    /// Clamp `value` to `0..=max`, push it to the OS, then commit. Returns the applied value.
    pub fn set_volume(&self, direction: Direction, value: i32) -> Result<i32, AudioError> {
        let target = clamp_volume(value, self.state(direction).max);
        self.backend.set_volume(direction, target)?;
        lock_or_recover(&self.mirror, "VolumeControl::set_volume")
            .get_mut(direction)
            .current = target;
        tracing::debug!(direction = direction.kind(), volume = target, "volume set");
        Ok(target)
    }

    pub fn set_mute(&self, direction: Direction, muted: bool) -> Result<bool, AudioError> {
        self.backend.set_muted(direction, muted)?;
        lock_or_recover(&self.mirror, "VolumeControl::set_mute")
            .get_mut(direction)
            .muted = muted;
        tracing::debug!(direction = direction.kind(), muted, "mute set");
        Ok(muted)
    }

    pub fn mute(&self, direction: Direction) -> Result<bool, AudioError> {
        self.set_mute(direction, true)
    }

    pub fn unmute(&self, direction: Direction) -> Result<bool, AudioError> {
        self.set_mute(direction, false)
    }

    pub fn toggle_mute(&self, direction: Direction) -> Result<bool, AudioError> {
        let muted = self.state(direction).muted;
        self.set_mute(direction, !muted)
    }

    /// Re-read both directions from the OS. Nothing is committed unless every query succeeds.
    pub fn sync(&self) -> Result<VolumeSnapshot, AudioError> {
        let mut readings = Vec::with_capacity(Direction::BOTH.len());
        for direction in Direction::BOTH {
            let volume = self.backend.volume(direction)?;
            let muted = self.backend.muted(direction)?;
            readings.push((direction, volume, muted));
        }

        let mut mirror = lock_or_recover(&self.mirror, "VolumeControl::sync");
        for (direction, volume, muted) in readings {
            let state = mirror.get_mut(direction);
            state.current = clamp_volume(volume, state.max);
            state.muted = muted;
        }
        let snapshot = *mirror;
        drop(mirror);
        tracing::debug!(
            output = snapshot.output.current,
            output_muted = snapshot.output.muted,
            input = snapshot.input.current,
            input_muted = snapshot.input.muted,
            "volume mirror synced"
        );
        Ok(snapshot)
    }
}
