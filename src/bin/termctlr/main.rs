//! termctlr dashboard entrypoint: speaker and microphone volume with live levels.
//!
//! The audio panel runs on the UI thread; change waits run on worker threads and post
//! their result back through a channel drained by the event loop.

mod cli_utils;
mod draw;
mod event_loop;

use anyhow::Result;
use std::time::Duration;
use termctlr::config::AppConfig;
use termctlr::widget::AudioWidget;
use termctlr::{init_logging, init_tracing, log_debug, log_file_path};

use crate::cli_utils::{list_devices, print_snapshot};
use crate::event_loop::run_dashboard;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    log_debug("=== termctlr started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    if config.list_devices {
        return list_devices();
    }
    if config.snapshot {
        return print_snapshot(&config);
    }

    let mut widget = AudioWidget::start(&config)?;
    let tick = Duration::from_millis(config.tick_ms);
    let result = run_dashboard(&mut widget, tick);
    log_debug("=== termctlr exiting ===");
    result
}
