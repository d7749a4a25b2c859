//! Dashboard screen mode: raw input, alternate screen, hidden cursor.
//!
//! [`TerminalRestoreGuard`] records each stage it managed to enter and undoes them in
//! reverse order when restored or dropped. A panic hook restores the screen too, since the
//! guard's own `Drop` may never run when the panic unwinds on another thread.

use crate::logging::{log_event, log_panic, LogSource};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

/// Set while a dashboard screen is up; the panic hook only restores when it is.
static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RawMode,
    AlternateScreen,
    HiddenCursor,
}

const DASHBOARD_STAGES: [Stage; 3] = [Stage::RawMode, Stage::AlternateScreen, Stage::HiddenCursor];

/// Owns the terminal modes entered for the dashboard.
#[derive(Debug)]
pub struct TerminalRestoreGuard {
    entered: Vec<Stage>,
}

impl TerminalRestoreGuard {
    /// Enter every dashboard stage on `out`. If one fails, the stages already entered are
    /// undone before the error is returned.
    pub fn enter(out: &mut impl Write) -> io::Result<Self> {
        install_panic_hook();
        let mut guard = Self {
            entered: Vec::with_capacity(DASHBOARD_STAGES.len()),
        };
        SCREEN_ACTIVE.store(true, Ordering::SeqCst);
        for stage in DASHBOARD_STAGES {
            if let Err(err) = enter_stage(stage, out) {
                log_event(LogSource::Terminal, &format!("entering {stage:?} failed: {err}"));
                guard.restore_into(out);
                SCREEN_ACTIVE.store(false, Ordering::SeqCst);
                return Err(err);
            }
            guard.entered.push(stage);
        }
        log_event(LogSource::Terminal, "dashboard screen entered");
        Ok(guard)
    }

    /// Leave the dashboard screen on stdout. Later calls do nothing.
    pub fn restore(&mut self) {
        self.restore_into(&mut io::stdout());
    }

    fn restore_into(&mut self, out: &mut impl Write) {
        if self.entered.is_empty() {
            return;
        }
        while let Some(stage) = self.entered.pop() {
            if let Err(err) = leave_stage(stage, out) {
                log_event(LogSource::Terminal, &format!("leaving {stage:?} failed: {err}"));
            }
        }
        let _ = out.flush();
        SCREEN_ACTIVE.store(false, Ordering::SeqCst);
        log_event(LogSource::Terminal, "dashboard screen restored");
    }
}

impl Drop for TerminalRestoreGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

fn enter_stage(stage: Stage, out: &mut impl Write) -> io::Result<()> {
    match stage {
        Stage::RawMode => enable_raw_mode(),
        Stage::AlternateScreen => execute!(out, EnterAlternateScreen),
        Stage::HiddenCursor => execute!(out, Hide),
    }
}

fn leave_stage(stage: Stage, out: &mut impl Write) -> io::Result<()> {
    match stage {
        Stage::RawMode => disable_raw_mode(),
        Stage::AlternateScreen => execute!(out, LeaveAlternateScreen),
        Stage::HiddenCursor => execute!(out, Show),
    }
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if SCREEN_ACTIVE.swap(false, Ordering::SeqCst) {
                let mut out = io::stdout();
                for stage in DASHBOARD_STAGES.into_iter().rev() {
                    let _ = leave_stage(stage, &mut out);
                }
                let _ = out.flush();
            }
            log_panic(info);
            previous(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_CURSOR: &[u8] = b"\x1b[?25h";
    const LEAVE_ALTERNATE: &[u8] = b"\x1b[?1049l";

    fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    #[test]
    fn restore_undoes_stages_in_reverse() {
        let mut guard = TerminalRestoreGuard {
            entered: vec![Stage::AlternateScreen, Stage::HiddenCursor],
        };
        let mut out = Vec::new();
        guard.restore_into(&mut out);

        let show = position(&out, SHOW_CURSOR).expect("cursor shown");
        let leave = position(&out, LEAVE_ALTERNATE).expect("alternate screen left");
        assert!(show < leave);
        assert!(guard.entered.is_empty());
    }

    #[test]
    fn restore_twice_writes_nothing_more() {
        let mut guard = TerminalRestoreGuard {
            entered: vec![Stage::HiddenCursor],
        };
        let mut out = Vec::new();
        guard.restore_into(&mut out);
        let written = out.len();
        guard.restore_into(&mut out);
        assert_eq!(out.len(), written);
    }

    #[test]
    fn only_entered_stages_are_undone() {
        let mut guard = TerminalRestoreGuard {
            entered: vec![Stage::HiddenCursor],
        };
        let mut out = Vec::new();
        guard.restore_into(&mut out);
        assert!(position(&out, SHOW_CURSOR).is_some());
        assert!(position(&out, LEAVE_ALTERNATE).is_none());
    }
}
