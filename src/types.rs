//! Core types for the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A message flowing through the dispatcher.
///
/// Messages are arbitrary JSON values; the configured
/// [`TypeSelector`](crate::selector::TypeSelector) extracts the type tag
/// that subscriptions match against.
pub type Message = serde_json::Value;

/// Unique identifier for a subscriber.
///
/// Assigned monotonically by the dispatcher instance that created it.
/// One subscriber may hold any number of subscriptions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

impl fmt::Debug for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriberId({})", self.0)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-use completion signal handed to handlers registered with
/// [`subscribe_with_completion`](crate::dispatcher::Dispatcher::subscribe_with_completion).
///
/// Consuming it releases one concurrency slot on the subscription the
/// message was dealt to. Dropping it without calling [`complete`] leaves
/// the slot occupied forever; there is no timeout.
///
/// [`complete`]: Completion::complete
pub struct Completion {
    signal: Box<dyn FnOnce() + Send>,
}

impl Completion {
    pub(crate) fn new(signal: impl FnOnce() + Send + 'static) -> Self {
        Self {
            signal: Box::new(signal),
        }
    }

    /// Signal that processing of the dealt message has finished.
    pub fn complete(self) {
        (self.signal)();
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}
