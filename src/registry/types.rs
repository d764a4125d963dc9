//! Subscription record and handler types.

use crate::types::{Completion, Message, SubscriberId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A registered message handler.
///
/// The completion style is fixed at registration time rather than inferred
/// from the callable: `Simple` handlers signal completion through their
/// [`Subscription`](crate::handles::Subscription) handle, `WithCompletion`
/// handlers receive a single-use [`Completion`] bound to the exact record
/// the message was dealt to.
#[derive(Clone)]
pub enum Handler {
    Simple(Arc<dyn Fn(Message) + Send + Sync>),
    WithCompletion(Arc<dyn Fn(Message, Completion) + Send + Sync>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Simple(_) => f.write_str("Handler::Simple"),
            Handler::WithCompletion(_) => f.write_str("Handler::WithCompletion"),
        }
    }
}

/// Internal subscription state.
///
/// Invariant: `0 <= current <= concurrency`. The record is *waiting* while
/// `current < concurrency`; only waiting records can be dealt to.
#[derive(Debug)]
pub(crate) struct SubscriptionRecord {
    pub subscriber: SubscriberId,
    pub message_type: String,
    pub concurrency: usize,
    pub current: usize,
    pub handler: Handler,
}

impl SubscriptionRecord {
    pub fn is_waiting(&self) -> bool {
        self.current < self.concurrency
    }
}

/// Read-only snapshot of one subscription, for introspection.
///
/// Never exposes the handler or permits counter mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub subscriber: SubscriberId,
    pub message_type: String,
    pub concurrency: usize,
    pub current: usize,
}

/// Outcome of dealing one message: the record's keys plus a handler clone,
/// so invocation can happen after the registry lock is released.
#[derive(Debug)]
pub(crate) struct Dealt {
    pub subscriber: SubscriberId,
    pub message_type: String,
    pub handler: Handler,
}
