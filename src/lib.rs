pub mod audio;
pub mod config;
mod lock;
mod logging;
mod telemetry;
pub mod terminal_restore;
pub mod widget;

pub(crate) use lock::lock_or_recover;
pub use logging::{
    crash_log_path, init_logging, log_debug, log_event, log_file_path, log_panic, log_timing,
    LogSource,
};
pub use telemetry::init_tracing;
