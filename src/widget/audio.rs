use super::{Effect, Message, Panel};
use crate::audio::{AudioCore, AudioError, ChangeEvent, Direction, VolumeState};
use crate::config::AppConfig;
use crate::log_debug;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const BAR_SEGMENTS: usize = 20;
const FILLED: char = '█';
const EMPTY: char = '░';

/// Drawn in place of a volume bar while that direction is muted.
pub const MUTED_BAR: &str = "░░░░░░░ mute ░░░░░░░";

/// Speaker/microphone volume panel with live signal levels.
pub struct AudioWidget {
    core: AudioCore,
    last_error: Option<AudioError>,
    size: Option<(u16, u16)>,
    feed_closed: bool,
}

impl AudioWidget {
    /// Open the default devices and `pactl` link described by `config`.
    pub fn start(config: &AppConfig) -> Result<Self> {
        let core = AudioCore::start(
            config.volume_settings(),
            &config.pactl_cmd,
            config.log_timings,
        )
        .context("failed to start audio core")?;
        Ok(Self::from_core(core))
    }

    /// Wrap an already running core and load the current OS state into its mirror.
    pub fn from_core(core: AudioCore) -> Self {
        let mut widget = Self {
            core,
            last_error: None,
            size: None,
            feed_closed: false,
        };
        widget.resync();
        widget
    }

    pub fn core(&self) -> &AudioCore {
        &self.core
    }

    /// Most recent failed volume action or sync, cleared by the next success.
    pub fn last_error(&self) -> Option<&AudioError> {
        self.last_error.as_ref()
    }

    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    fn wait_for_change(&self) -> Effect {
        let waiter = self.core.waiter();
        Effect::spawn(move || match waiter.wait() {
            ChangeEvent::Changed => Message::VolumeChanged,
            ChangeEvent::Closed => Message::ChangeFeedClosed,
        })
    }

    fn resync(&mut self) {
        let result = self.core.volume().sync();
        self.record(result, "sync");
    }

    fn record<T>(&mut self, result: Result<T, AudioError>, action: &str) {
        match result {
            Ok(_) => self.last_error = None,
            Err(err) => {
                log_debug(&format!("audio {action} failed: {err}"));
                if err.is_recoverable() {
                    tracing::warn!(action, error = %err, "volume action failed");
                } else {
                    tracing::error!(action, error = %err, "audio core error");
                }
                self.last_error = Some(err);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                return self.quit();
            }
            return Vec::new();
        }

        let volume = self.core.volume();
        match key.code {
            KeyCode::Char('q') => return self.quit(),
            KeyCode::Char('=') | KeyCode::Char('+') | KeyCode::Up => {
                let result = volume.increment(Direction::Output);
                self.record(result, "increase output");
            }
            KeyCode::Char('-') | KeyCode::Down => {
                let result = volume.decrement(Direction::Output);
                self.record(result, "decrease output");
            }
            KeyCode::Char('m') => {
                let result = volume.toggle_mute(Direction::Output);
                self.record(result, "toggle output mute");
            }
            KeyCode::Char(']') => {
                let result = volume.increment(Direction::Input);
                self.record(result, "increase input");
            }
            KeyCode::Char('[') => {
                let result = volume.decrement(Direction::Input);
                self.record(result, "decrease input");
            }
            KeyCode::Char('n') => {
                let result = volume.toggle_mute(Direction::Input);
                self.record(result, "toggle input mute");
            }
            KeyCode::Char('r') => self.resync(),
            _ => {}
        }
        Vec::new()
    }

    fn quit(&mut self) -> Vec<Effect> {
        self.core.close();
        vec![Effect::Quit]
    }

    fn on_change(&mut self) -> Vec<Effect> {
        if self.core.is_closed() {
            return Vec::new();
        }
        self.resync();
        vec![self.wait_for_change()]
    }

    fn on_feed_closed(&mut self) {
        if !self.feed_closed {
            self.feed_closed = true;
            log_debug("audio change feed closed; external changes will not be tracked");
        }
    }
}

impl Panel for AudioWidget {
    fn init(&mut self) -> Vec<Effect> {
        vec![self.wait_for_change()]
    }

    fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Tick(_) => Vec::new(),
            Message::Resize { width, height } => {
                self.size = Some((width, height));
                Vec::new()
            }
            Message::VolumeChanged => self.on_change(),
            Message::ChangeFeedClosed => {
                self.on_feed_closed();
                Vec::new()
            }
        }
    }

    fn view(&self) -> String {
        let snapshot = self.core.volume().snapshot();
        let levels = self.core.levels();
        let mut out = String::new();
        for direction in Direction::BOTH {
            let state = snapshot.get(direction);
            out.push_str(&format!(
                "{} {} {:>3}%\n",
                direction.label(),
                volume_bar(state),
                state.current
            ));
        }
        out.push_str(&format!(
            "Lvl in {:>6.1} dB  out {:>6.1} dB",
            levels.input.db(),
            levels.output.db()
        ));
        out
    }
}

pub(crate) fn volume_bar(state: &VolumeState) -> String {
    if state.muted {
        return MUTED_BAR.to_string();
    }
    let filled = state.filled_segments(BAR_SEGMENTS);
    let mut bar = String::with_capacity(BAR_SEGMENTS * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(BAR_SEGMENTS - filled));
    bar
}
