//! Default values shared by the CLI and the audio core.

/// Volume hop applied per increment/decrement.
pub const DEFAULT_VOLUME_STEP: i32 = 5;
/// Ceiling for both the input and output volume.
pub const DEFAULT_VOLUME_CEILING: i32 = 100;
/// pactl refuses boosts above 153%, so keep ceilings under that.
pub const MAX_VOLUME_CEILING: i32 = 150;

/// Dashboard tick cadence.
pub const DEFAULT_TICK_MS: u64 = 1_000;
pub const MIN_TICK_MS: u64 = 100;
pub const MAX_TICK_MS: u64 = 10_000;

/// Binary names accepted for `--pactl-cmd` without a path.
pub(super) const PACTL_ALLOWLIST: &[&str] = &["pactl"];
