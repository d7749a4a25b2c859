//! Audio device monitoring and OS volume control.
//!
//! Device streams feed lock-free level slots from the driver's callback thread, the volume
//! facade mirrors `pactl` state behind a short-lived lock, and a single listener thread
//! turns `pactl subscribe` output into change notifications.

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod meter;
mod pactl;
mod runtime;
mod session;
mod subscriber;
mod volume;

pub use error::{AudioError, StreamKind};
pub use meter::{rms_i16, rms_le_bytes, rms_to_db, LevelSlot, Levels, SILENCE_DB};
pub use pactl::{PactlBackend, VolumeBackend};
pub use runtime::AudioCore;
pub use session::{list_devices, DeviceSession};
pub use subscriber::{ChangeEvent, ChangeSubscriber, ChangeWaiter, SubscriberState};
pub use volume::{
    clamp_volume, Direction, VolumeControl, VolumeSettings, VolumeSnapshot, VolumeState,
};
