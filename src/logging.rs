//! Debug and crash logs kept in the temp dir so nothing is printed over the dashboard.
//!
//! Lines are tagged with the subsystem that wrote them (`device`, `pactl`, `listener`, ...)
//! so a single run can be followed across the stream callbacks, the control utility and the
//! change listener. Nothing is written unless logging was switched on with `--logs` or
//! `--log-timings`. When the debug log reaches its cap the file is moved to `<name>.old`
//! and a fresh one is started.

use crate::config::AppConfig;
use std::any::Any;
use std::env;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEBUG_LOG_CAP: u64 = 5 * 1024 * 1024;
const CRASH_LOG_CAP: u64 = 256 * 1024;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: OnceLock<Mutex<Option<CappedFile>>> = OnceLock::new();

/// Subsystem a debug line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    App,
    Device,
    Pactl,
    Listener,
    Terminal,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogSource::App => "app",
            LogSource::Device => "device",
            LogSource::Pactl => "pactl",
            LogSource::Listener => "listener",
            LogSource::Terminal => "terminal",
        })
    }
}

pub fn log_file_path() -> PathBuf {
    env::temp_dir().join("termctlr_tui.log")
}

pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("termctlr_crash.log")
}

struct CappedFile {
    path: PathBuf,
    file: File,
    len: u64,
    cap: u64,
}

impl CappedFile {
    fn open(path: PathBuf, cap: u64) -> io::Result<Self> {
        let file = append_to(&path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            len,
            cap,
        })
    }

    fn append(&mut self, line: &str) -> io::Result<()> {
        let next = line.len() as u64;
        if self.len > 0 && self.len.saturating_add(next) > self.cap {
            self.roll()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.len = self.len.saturating_add(next);
        Ok(())
    }

    fn roll(&mut self) -> io::Result<()> {
        fs::rename(&self.path, rolled_path(&self.path))?;
        self.file = append_to(&self.path)?;
        self.len = 0;
        Ok(())
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn rolled_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".old");
    PathBuf::from(name)
}

fn debug_log() -> &'static Mutex<Option<CappedFile>> {
    DEBUG_LOG.get_or_init(|| Mutex::new(None))
}

/// Switch file logging on or off from the parsed CLI flags.
pub fn init_logging(config: &AppConfig) {
    configure(config.logging_enabled().then(log_file_path));
}

fn configure(target: Option<PathBuf>) {
    ENABLED.store(target.is_some(), Ordering::Relaxed);
    let file = target.and_then(|path| match CappedFile::open(path, DEBUG_LOG_CAP) {
        Ok(file) => Some(file),
        Err(err) => {
            tracing::warn!(error = %err, "debug log unavailable");
            None
        }
    });
    // Not `lock_or_recover`: its poison path logs through here.
    *debug_log().lock().unwrap_or_else(PoisonError::into_inner) = file;
}

pub fn log_event(source: LogSource, msg: &str) {
    if !ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let line = format!("[{}] {source} {msg}\n", timestamp());
    let mut log = debug_log().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(file) = log.as_mut() {
        if file.append(&line).is_err() {
            *log = None;
        }
    }
}

pub fn log_debug(msg: &str) {
    log_event(LogSource::App, msg);
}

/// How long one external call took, e.g. a single `pactl` query.
pub fn log_timing(source: LogSource, subject: &str, elapsed: Duration) {
    log_event(
        source,
        &format!("timing cmd={subject:?} elapsed_ms={}", elapsed.as_millis()),
    );
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

/// Append the panic to the crash log (when logging is on). Called from the panic hook.
pub fn log_panic(info: &PanicHookInfo<'_>) {
    if !ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let current = thread::current();
    let location = info
        .location()
        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
        .unwrap_or_else(|| "unknown location".to_string());
    let entry = format!(
        "[{}] termctlr {} panicked in thread '{}' at {location}: {}\n",
        timestamp(),
        env!("CARGO_PKG_VERSION"),
        current.name().unwrap_or("unnamed"),
        panic_message(info.payload()),
    );
    if let Ok(mut file) = CappedFile::open(crash_log_path(), CRASH_LOG_CAP) {
        let _ = file.append(&entry);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
