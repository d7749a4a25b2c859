//! Watches the audio server for volume/mute changes made outside this process.
//!
//! One listener thread reads `pactl subscribe` for the life of the audio core and pushes a
//! payload-free notification into a single-slot channel for every sink/source event.
//! Consumers call [`ChangeWaiter::wait`] again after each notification; the listener is
//! never restarted. Killing the subprocess is what ends the listener: EOF on its stdout
//! terminates the read loop.

use super::pactl::subscribe_command;
use crate::{log_event, LogSource};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::{self, BufRead, BufReader};
use std::process::Child;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long `close` keeps draining the conduit while waiting for the listener to exit.
const LISTENER_EXIT_GRACE: Duration = Duration::from_millis(500);
const LISTENER_EXIT_POLL: Duration = Duration::from_millis(10);

/// Lifecycle of the background listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    NotStarted,
    Listening,
    Delivering,
    Stopped,
}

impl SubscriberState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SubscriberState::NotStarted,
            1 => SubscriberState::Listening,
            2 => SubscriberState::Delivering,
            _ => SubscriberState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SubscriberState::NotStarted => 0,
            SubscriberState::Listening => 1,
            SubscriberState::Delivering => 2,
            SubscriberState::Stopped => 3,
        }
    }
}

/// Outcome of one wait on the change conduit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Something changed; re-query the OS.
    Changed,
    /// The listener is gone and no further notifications will arrive.
    Closed,
}

#[derive(Debug)]
struct ListenerStatus {
    state: AtomicU8,
    live: AtomicUsize,
}

impl ListenerStatus {
    fn set(&self, state: SubscriberState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

/// Cloneable handle used by wait tasks; owns no listener resources.
#[derive(Debug, Clone)]
pub struct ChangeWaiter {
    receiver: Receiver<()>,
}

impl ChangeWaiter {
    /// Block until the next notification or until the listener has ended.
    pub fn wait(&self) -> ChangeEvent {
        match self.receiver.recv() {
            Ok(()) => ChangeEvent::Changed,
            Err(_) => ChangeEvent::Closed,
        }
    }
}

/// Owner of the listener thread and the subscription subprocess.
pub struct ChangeSubscriber {
    process: Option<Child>,
    receiver: Receiver<()>,
    status: Arc<ListenerStatus>,
    listener: Option<JoinHandle<()>>,
}

impl ChangeSubscriber {
    /// Start `<program> subscribe` and its listener. If the subprocess cannot be started
    /// the subscriber is inert: it never delivers, and waits resolve to `Closed`.
    pub fn spawn(program: &str) -> Self {
        let mut child = match subscribe_command(program).spawn() {
            Ok(child) => child,
            Err(err) => {
                let msg = format!("{program} subscribe failed to start: {err}");
                log_event(LogSource::Listener, &msg);
                tracing::warn!(program, error = %err, "change listener unavailable");
                return Self::inert();
            }
        };
        let Some(stdout) = child.stdout.take() else {
            let msg = format!("{program} subscribe has no stdout; listener disabled");
            log_event(LogSource::Listener, &msg);
            let _ = child.kill();
            let _ = child.wait();
            return Self::inert();
        };
        let mut subscriber = Self::from_lines(BufReader::new(stdout).lines());
        subscriber.process = Some(child);
        subscriber
    }

    /// Start a listener over an arbitrary line feed (no subprocess to kill).
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: Iterator<Item = io::Result<String>> + Send + 'static,
    {
        let (sender, receiver) = bounded(1);
        let status = Arc::new(ListenerStatus {
            state: AtomicU8::new(SubscriberState::NotStarted.as_u8()),
            live: AtomicUsize::new(0),
        });
        status.live.fetch_add(1, Ordering::SeqCst);
        let thread_status = Arc::clone(&status);
        let listener = thread::spawn(move || run_listener(lines, sender, &thread_status));
        Self {
            process: None,
            receiver,
            status,
            listener: Some(listener),
        }
    }

    fn inert() -> Self {
        let (_sender, receiver) = bounded(1);
        Self {
            process: None,
            receiver,
            status: Arc::new(ListenerStatus {
                state: AtomicU8::new(SubscriberState::Stopped.as_u8()),
                live: AtomicUsize::new(0),
            }),
            listener: None,
        }
    }

    pub fn waiter(&self) -> ChangeWaiter {
        ChangeWaiter {
            receiver: self.receiver.clone(),
        }
    }

    pub fn state(&self) -> SubscriberState {
        SubscriberState::from_u8(self.status.state.load(Ordering::SeqCst))
    }

    /// Listener threads currently running for this subscriber (0 or 1).
    pub fn live_listeners(&self) -> usize {
        self.status.live.load(Ordering::SeqCst)
    }

    /// Kill the subprocess and wait briefly for the listener to notice EOF.
    pub fn close(&mut self) {
        if let Some(mut child) = self.process.take() {
            if let Err(err) = child.kill() {
                log_event(LogSource::Listener, &format!("kill failed: {err}"));
            }
            let _ = child.wait();
        }
        let Some(listener) = self.listener.take() else {
            return;
        };
        let deadline = Instant::now() + LISTENER_EXIT_GRACE;
        while !listener.is_finished() {
            // A listener parked on a full slot only wakes once the slot is drained.
            while self.receiver.try_recv().is_ok() {}
            if Instant::now() >= deadline {
                log_event(LogSource::Listener, "still running after close; detached");
                return;
            }
            thread::sleep(LISTENER_EXIT_POLL);
        }
        let _ = listener.join();
    }
}

impl Drop for ChangeSubscriber {
    fn drop(&mut self) {
        self.close();
    }
}

pub(crate) fn is_volume_event(line: &str) -> bool {
    line.contains("sink") || line.contains("source")
}

fn run_listener<I>(lines: I, sender: Sender<()>, status: &ListenerStatus)
where
    I: Iterator<Item = io::Result<String>>,
{
    status.set(SubscriberState::Listening);
    log_event(LogSource::Listener, "started");
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log_event(LogSource::Listener, &format!("read error: {err}"));
                break;
            }
        };
        if !is_volume_event(&line) {
            continue;
        }
        status.set(SubscriberState::Delivering);
        if sender.send(()).is_err() {
            break;
        }
        status.set(SubscriberState::Listening);
    }
    status.set(SubscriberState::Stopped);
    status.live.fetch_sub(1, Ordering::SeqCst);
    log_event(LogSource::Listener, "stopped");
}
