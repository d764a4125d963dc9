//! Pull scheduling: overlap guard, timer thread, and the default
//! buffer-backed pull source.

use crate::error::Result;
use crate::selector::TypeSelector;
use crate::types::Message;
use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// External pull function: given the distinct types with waiting
/// subscriptions, yield at most one matching message. Returning `Ok(None)`
/// means the source has nothing to offer right now.
pub type PullFn = Box<dyn Fn(&[String]) -> Result<Option<Message>> + Send + Sync>;

/// Where checks pull messages from.
pub(crate) enum PullSource {
    /// Caller-supplied function, the sole asynchronous boundary.
    External(PullFn),
    /// In-process pending buffer, used when no external source is given.
    Buffer,
}

/// FIFO buffer of messages awaiting a type match.
///
/// Only consulted by the default pull source; meaningless (but harmless)
/// when an external pull function is configured.
pub(crate) struct PendingBuffer {
    queue: Mutex<VecDeque<Message>>,
}

impl PendingBuffer {
    pub fn new(initial: Vec<Message>) -> Self {
        Self {
            queue: Mutex::new(initial.into()),
        }
    }

    pub fn push(&self, message: Message) {
        self.queue.lock().push_back(message);
    }

    /// Remove and return the first buffered message whose selected type is
    /// in the waiting set. FIFO within a type; consumed destructively.
    pub fn take_matching(&self, waiting: &[String], selector: &TypeSelector) -> Option<Message> {
        let mut queue = self.queue.lock();
        let position = queue.iter().position(|m| {
            selector
                .select(m)
                .is_some_and(|t| waiting.iter().any(|w| *w == t))
        })?;
        queue.remove(position)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Scheduling state: the single in-flight flag and the timer control.
///
/// The busy flag is the only concurrency primitive in the dispatcher: it
/// guarantees at most one pull is outstanding, whatever thread a `check`
/// arrives on.
pub(crate) struct PullScheduler {
    busy: AtomicBool,
    /// Dropping the sender disconnects the timer thread's stop channel,
    /// which makes it exit. `None` while unstarted.
    stop: Mutex<Option<Sender<()>>>,
    interval: Duration,
}

impl PullScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            busy: AtomicBool::new(false),
            stop: Mutex::new(None),
            interval,
        }
    }

    /// Claim the in-flight flag. Returns false when a pull is already
    /// outstanding, in which case the caller must back off.
    pub fn try_begin(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the in-flight flag.
    pub fn finish(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Arm the recurring timer. Idempotent: a second call while running is
    /// a no-op. The spawned thread performs one immediate check, then one
    /// per interval; it is detached, so it never keeps the process alive
    /// past `main`.
    pub fn start(&self, check: impl Fn() + Send + 'static) {
        let mut stop = self.stop.lock();
        if stop.is_some() {
            return;
        }

        let (tx, rx) = bounded::<()>(0);
        *stop = Some(tx);
        let interval = self.interval;

        thread::spawn(move || {
            debug!(?interval, "pull scheduler started");
            check();
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => check(),
                    recv(rx) -> _ => break,
                }
            }
            debug!("pull scheduler stopped");
        });
    }

    /// Cancel the timer and mark the scheduler unstarted. A second `stop`
    /// is a no-op.
    pub fn stop(&self) {
        // Dropping the sender wakes the timer thread via disconnect
        self.stop.lock().take();
    }

    pub fn is_started(&self) -> bool {
        self.stop.lock().is_some()
    }
}
