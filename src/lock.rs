use std::sync::{Mutex, MutexGuard};

/// Take the mirror lock even if a previous holder panicked; the guarded data is plain
/// integers and flags, so the last committed values are still usable.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, owner: &str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        tracing::warn!(owner, "mutex poisoned; recovering");
        crate::log_debug(&format!("{owner}: mutex poisoned, using last committed state"));
        poisoned.into_inner()
    })
}
