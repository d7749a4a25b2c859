use super::error::AudioError;
use super::meter::Levels;
use super::pactl::{PactlBackend, VolumeBackend};
use super::session::DeviceSession;
use super::subscriber::{ChangeSubscriber, ChangeWaiter};
use super::volume::{VolumeControl, VolumeSettings};
use crate::{log_event, LogSource};
use std::sync::Arc;

/// Everything the audio panel owns: device streams, level slots, the volume facade and
/// the change listener. Released as a unit by [`AudioCore::close`] or on drop.
pub struct AudioCore {
    levels: Levels,
    session: Option<DeviceSession>,
    volume: VolumeControl,
    subscriber: ChangeSubscriber,
    closed: bool,
}

impl AudioCore {
    /// Start both monitor streams, then wire the facade and listener to `pactl_program`.
    ///
    /// Stream or driver failures are fatal: nothing is left running on error.
    pub fn start(
        settings: VolumeSettings,
        pactl_program: &str,
        log_timings: bool,
    ) -> Result<Self, AudioError> {
        let levels = Levels::default();
        let session = DeviceSession::start(&levels)?;
        let backend = Arc::new(PactlBackend::new(pactl_program).with_timings(log_timings));
        let subscriber = ChangeSubscriber::spawn(pactl_program);
        Ok(Self::from_parts(
            levels,
            Some(session),
            backend,
            settings,
            subscriber,
        ))
    }

    /// Assemble a core from pre-built pieces; `session` may be absent when no device
    /// streams are wanted.
    pub fn from_parts(
        levels: Levels,
        session: Option<DeviceSession>,
        backend: Arc<dyn VolumeBackend>,
        settings: VolumeSettings,
        subscriber: ChangeSubscriber,
    ) -> Self {
        Self {
            levels,
            session,
            volume: VolumeControl::new(backend, settings),
            subscriber,
            closed: false,
        }
    }

    pub fn volume(&self) -> &VolumeControl {
        &self.volume
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    pub fn subscriber(&self) -> &ChangeSubscriber {
        &self.subscriber
    }

    pub fn waiter(&self) -> ChangeWaiter {
        self.subscriber.waiter()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop the streams, then kill the change listener. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        self.subscriber.close();
        self.levels.input.store_rms(0.0);
        self.levels.output.store_rms(0.0);
        log_event(LogSource::Device, "audio core closed");
    }
}

impl Drop for AudioCore {
    fn drop(&mut self) {
        self.close();
    }
}
