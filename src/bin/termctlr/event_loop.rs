//! Dashboard loop: terminal events, ticks and finished tasks become panel messages.

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event};
use crossterm::terminal::size as terminal_size;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::thread;
use std::time::{Duration, Instant};
use termctlr::log_debug;
use termctlr::terminal_restore::TerminalRestoreGuard;
use termctlr::widget::{AudioWidget, Effect, Message, Panel};

/// Upper bound on a single input poll so finished tasks are picked up promptly.
const EVENT_POLL_MS: u64 = 50;

/// Configure the terminal, run the panel until it quits, and put the terminal back.
pub(crate) fn run_dashboard(widget: &mut AudioWidget, tick: Duration) -> Result<()> {
    let mut stdout = io::stdout();
    let mut screen = TerminalRestoreGuard::enter(&mut stdout)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = dashboard_loop(&mut terminal, widget, tick);

    drop(terminal);
    screen.restore();
    result
}

fn dashboard_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    widget: &mut AudioWidget,
    tick: Duration,
) -> Result<()> {
    let (task_tx, task_rx) = unbounded();
    let mut quit = run_effects(widget.init(), &task_tx);
    if let Ok((width, height)) = terminal_size() {
        quit |= run_effects(widget.update(Message::Resize { width, height }), &task_tx);
    }
    terminal.draw(|frame| crate::draw::draw(frame, widget))?;

    let mut next_tick = Instant::now() + tick;
    while !quit {
        let mut messages = drain_tasks(&task_rx);

        let now = Instant::now();
        if now >= next_tick {
            messages.push(Message::Tick(now));
            next_tick = now + tick;
        }

        let poll = next_tick
            .saturating_duration_since(now)
            .min(Duration::from_millis(EVENT_POLL_MS));
        if event::poll(poll)? {
            match event::read()? {
                Event::Key(key) => messages.push(Message::Key(key)),
                Event::Resize(width, height) => messages.push(Message::Resize { width, height }),
                _ => {}
            }
        }

        if messages.is_empty() {
            continue;
        }
        for message in messages {
            if run_effects(widget.update(message), &task_tx) {
                quit = true;
                break;
            }
        }
        if !quit {
            terminal.draw(|frame| crate::draw::draw(frame, widget))?;
        }
    }
    Ok(())
}

fn drain_tasks(task_rx: &Receiver<Message>) -> Vec<Message> {
    let mut messages = Vec::new();
    while let Ok(message) = task_rx.try_recv() {
        messages.push(message);
    }
    messages
}

/// Start spawned tasks on worker threads. Returns true when the panel asked to quit.
fn run_effects(effects: Vec<Effect>, task_tx: &Sender<Message>) -> bool {
    let mut quit = false;
    for effect in effects {
        match effect {
            Effect::Spawn(task) => {
                let tx = task_tx.clone();
                let spawned = thread::Builder::new()
                    .name("termctlr-task".into())
                    .spawn(move || {
                        // The loop may already be gone after quit.
                        let _ = tx.send(task());
                    });
                if let Err(err) = spawned {
                    log_debug(&format!("failed to spawn panel task: {err}"));
                }
            }
            Effect::Quit => quit = true,
        }
    }
    quit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_effects_reports_quit() {
        let (tx, _rx) = unbounded();
        assert!(!run_effects(Vec::new(), &tx));
        assert!(run_effects(vec![Effect::Quit], &tx));
    }

    #[test]
    fn spawned_task_result_is_drained() {
        let (tx, rx) = unbounded();
        assert!(!run_effects(
            vec![Effect::spawn(|| Message::VolumeChanged)],
            &tx
        ));
        let message = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("task result");
        assert_eq!(message, Message::VolumeChanged);
        tx.send(Message::ChangeFeedClosed).expect("send");
        assert_eq!(drain_tasks(&rx), vec![Message::ChangeFeedClosed]);
    }
}
