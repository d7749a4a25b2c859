//! Cooperative panel contract used by the dashboard driver.
//!
//! A panel never blocks the render thread: long waits are handed back to the driver as
//! [`Effect::Spawn`] tasks, which run elsewhere and report their outcome as a [`Message`].

mod audio;
#[cfg(test)]
mod tests;

pub use audio::{AudioWidget, MUTED_BAR};

use crossterm::event::KeyEvent;
use std::fmt;
use std::time::Instant;

/// Deferred work the driver runs off the UI thread; its result is fed back into `update`.
pub type Task = Box<dyn FnOnce() -> Message + Send + 'static>;

/// Inputs delivered to a panel, one at a time, on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Key(KeyEvent),
    Tick(Instant),
    Resize { width: u16, height: u16 },
    /// The OS volume or mute changed outside this panel.
    VolumeChanged,
    /// The change feed ended; no further notifications will arrive.
    ChangeFeedClosed,
}

/// What a panel asks the driver to do after `init` or `update`.
pub enum Effect {
    Spawn(Task),
    Quit,
}

impl Effect {
    pub fn spawn(task: impl FnOnce() -> Message + Send + 'static) -> Self {
        Effect::Spawn(Box::new(task))
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Effect::Quit)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Spawn(_) => f.write_str("Spawn(..)"),
            Effect::Quit => f.write_str("Quit"),
        }
    }
}

pub trait Panel {
    fn init(&mut self) -> Vec<Effect>;
    fn update(&mut self, message: Message) -> Vec<Effect>;
    fn view(&self) -> String;
}
