//! Error types for the audio core.

use std::fmt;
use thiserror::Error;

/// Which live device stream an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Capture,
    Playback,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamKind::Capture => "capture",
            StreamKind::Playback => "playback",
        })
    }
}

/// Errors surfaced by the device session and the volume facade.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The audio host or its default devices could not be acquired.
    #[error("audio driver init failed: {0}")]
    DriverInitFailed(String),

    /// A device stream could not be built or started.
    #[error("{stream} stream failed to start: {message}")]
    StreamStartFailed { stream: StreamKind, message: String },

    /// The control utility could not run or exited with a failure status.
    #[error("`{command}` failed: {detail}")]
    OsCommandFailed { command: String, detail: String },

    /// The control utility ran but printed something we could not read.
    #[error("could not parse output of `{command}`: {output:?}")]
    ParseFailed { command: String, output: String },
}

impl AudioError {
    pub(crate) fn stream(stream: StreamKind, err: impl fmt::Display) -> Self {
        Self::StreamStartFailed {
            stream,
            message: err.to_string(),
        }
    }

    /// True for errors that leave the mirrored state untouched and can be shown to the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AudioError::OsCommandFailed { .. } | AudioError::ParseFailed { .. }
        )
    }
}
