use super::audio::volume_bar;
use super::*;
use crate::audio::fake::FakeBackend;
use crate::audio::{AudioCore, ChangeSubscriber, Direction, Levels, VolumeSettings, VolumeState};
use crossbeam_channel::{unbounded, Sender};
use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// `feed` is declared first so it drops first: the listener sees EOF before the core closes.
struct Harness {
    feed: Option<Sender<String>>,
    widget: AudioWidget,
    backend: Arc<FakeBackend>,
}

impl Harness {
    fn new(volume: i32) -> Self {
        let (tx, rx) = unbounded::<String>();
        let subscriber = ChangeSubscriber::from_lines(rx.into_iter().map(Ok::<_, io::Error>));
        let backend = Arc::new(FakeBackend::with_volume(volume));
        let core = AudioCore::from_parts(
            Levels::default(),
            None,
            backend.clone(),
            VolumeSettings::default(),
            subscriber,
        );
        Self {
            feed: Some(tx),
            widget: AudioWidget::from_core(core),
            backend,
        }
    }

    fn press(&mut self, code: KeyCode) -> Vec<Effect> {
        self.widget
            .update(Message::Key(KeyEvent::new(code, KeyModifiers::empty())))
    }

    fn emit(&self, line: &str) {
        self.feed
            .as_ref()
            .expect("feed open")
            .send(line.to_string())
            .expect("listener alive");
    }

    fn output(&self) -> VolumeState {
        self.widget.core().volume().state(Direction::Output)
    }
}

fn run_single_task(mut effects: Vec<Effect>) -> Message {
    assert_eq!(effects.len(), 1, "expected exactly one effect");
    match effects.remove(0) {
        Effect::Spawn(task) => {
            let (tx, rx) = crossbeam_channel::bounded(1);
            thread::spawn(move || {
                let _ = tx.send(task());
            });
            rx.recv_timeout(Duration::from_secs(2))
                .expect("wait task resolved")
        }
        Effect::Quit => panic!("expected a spawned task"),
    }
}

#[test]
fn construction_loads_os_state() {
    let harness = Harness::new(35);
    assert_eq!(harness.output().current, 35);
    assert!(harness.widget.last_error().is_none());
}

#[test]
fn init_arms_one_change_wait() {
    let mut harness = Harness::new(50);
    let effects = harness.widget.init();
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::Spawn(_)));
}

#[test]
fn change_notification_syncs_and_rearms_once() {
    let mut harness = Harness::new(50);
    let effects = harness.widget.init();

    harness
        .backend
        .report(Direction::Output, "Volume: 42%", "Mute: yes");
    harness.emit("Event 'change' on sink #54");
    let message = run_single_task(effects);
    assert_eq!(message, Message::VolumeChanged);

    let effects = harness.widget.update(message);
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::Spawn(_)));
    assert_eq!(harness.output().current, 42);
    assert!(harness.output().muted);
    assert_eq!(harness.widget.core().subscriber().live_listeners(), 1);

    harness.emit("Event 'change' on source #2");
    assert_eq!(run_single_task(effects), Message::VolumeChanged);
    assert_eq!(harness.widget.core().subscriber().live_listeners(), 1);
}

#[test]
fn closed_feed_stops_rearming() {
    let mut harness = Harness::new(50);
    let effects = harness.widget.init();
    harness.feed = None;
    let message = run_single_task(effects);
    assert_eq!(message, Message::ChangeFeedClosed);
    assert!(harness.widget.update(message.clone()).is_empty());
    assert!(harness.widget.update(message).is_empty());
}

#[test]
fn output_keys_drive_volume_facade() {
    let mut harness = Harness::new(50);
    assert!(harness.press(KeyCode::Char('=')).is_empty());
    assert_eq!(harness.output().current, 55);
    harness.press(KeyCode::Char('+'));
    harness.press(KeyCode::Up);
    assert_eq!(harness.output().current, 65);
    harness.press(KeyCode::Char('-'));
    harness.press(KeyCode::Down);
    assert_eq!(harness.output().current, 55);
    harness.press(KeyCode::Char('m'));
    assert!(harness.output().muted);
}

#[test]
fn input_keys_drive_microphone() {
    let mut harness = Harness::new(20);
    harness.press(KeyCode::Char(']'));
    let input = harness.widget.core().volume().state(Direction::Input);
    assert_eq!(input.current, 25);
    harness.press(KeyCode::Char('['));
    harness.press(KeyCode::Char('['));
    let input = harness.widget.core().volume().state(Direction::Input);
    assert_eq!(input.current, 15);
    harness.press(KeyCode::Char('n'));
    assert!(harness.widget.core().volume().state(Direction::Input).muted);
    assert_eq!(harness.output().current, 20);
}

#[test]
fn key_release_is_ignored() {
    let mut harness = Harness::new(50);
    let mut key = KeyEvent::new(KeyCode::Up, KeyModifiers::empty());
    key.kind = KeyEventKind::Release;
    harness.widget.update(Message::Key(key));
    assert_eq!(harness.output().current, 50);
}

#[test]
fn failed_action_is_kept_then_cleared() {
    let mut harness = Harness::new(50);
    harness.backend.fail_commands(true);
    harness.press(KeyCode::Up);
    assert_eq!(harness.output().current, 50);
    assert!(harness.widget.last_error().is_some());

    harness.backend.fail_commands(false);
    harness.press(KeyCode::Up);
    assert_eq!(harness.output().current, 55);
    assert!(harness.widget.last_error().is_none());
}

#[test]
fn resync_key_reloads_external_change() {
    let mut harness = Harness::new(50);
    harness
        .backend
        .report(Direction::Output, "Volume: 12%", "Mute: no");
    harness.press(KeyCode::Char('r'));
    assert_eq!(harness.output().current, 12);
}

#[test]
fn quit_closes_core_before_signalling() {
    let mut harness = Harness::new(50);
    harness.feed = None;
    let effects = harness.press(KeyCode::Char('q'));
    assert_eq!(effects.len(), 1);
    assert!(effects[0].is_quit());
    assert!(harness.widget.core().is_closed());
    assert_eq!(harness.widget.core().subscriber().live_listeners(), 0);
}

#[test]
fn ctrl_c_quits() {
    let mut harness = Harness::new(50);
    let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    let effects = harness.widget.update(Message::Key(key));
    assert!(effects.iter().any(Effect::is_quit));
    assert!(harness.widget.core().is_closed());
}

#[test]
fn resize_and_tick_do_not_schedule_work() {
    let mut harness = Harness::new(50);
    let effects = harness.widget.update(Message::Resize {
        width: 80,
        height: 24,
    });
    assert!(effects.is_empty());
    assert_eq!(harness.widget.size(), Some((80, 24)));
    assert!(harness.widget.update(Message::Tick(Instant::now())).is_empty());
}

#[test]
fn view_renders_bars_and_levels() {
    let mut harness = Harness::new(50);
    harness.press(KeyCode::Char('n'));
    let view = harness.widget.view();
    let lines: Vec<&str> = view.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Vol "));
    assert!(lines[0].contains("██████████░░░░░░░░░░"));
    assert!(lines[0].ends_with(" 50%"));
    assert!(lines[1].starts_with("Mic "));
    assert!(lines[1].contains(MUTED_BAR));
    assert!(lines[2].contains("-90.0 dB"));
}

#[test]
fn volume_bar_has_twenty_segments() {
    let state = |current, muted| VolumeState {
        current,
        max: 100,
        muted,
        step: 5,
    };
    assert_eq!(volume_bar(&state(0, false)).chars().count(), 20);
    assert_eq!(volume_bar(&state(100, false)), "█".repeat(20));
    assert_eq!(volume_bar(&state(0, false)), "░".repeat(20));
    assert_eq!(MUTED_BAR.chars().count(), 20);
    assert_eq!(volume_bar(&state(80, true)), MUTED_BAR);
}

#[test]
fn volume_bar_only_fills_at_ceiling() {
    let bar = |current, max| {
        let state = VolumeState {
            current,
            max,
            muted: false,
            step: 5,
        };
        volume_bar(&state).chars().filter(|&c| c == '█').count()
    };
    assert_eq!(bar(58, 100), 11);
    assert_eq!(bar(98, 100), 19);
    assert_eq!(bar(99, 100), 19);
    assert_eq!(bar(100, 100), 20);
    assert_eq!(bar(35, 100), 7);
    assert_eq!(bar(149, 150), 19);
    assert_eq!(bar(150, 150), 20);
}
