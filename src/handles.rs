//! Subscriber and subscription handles.
//!
//! Thin façades over the dispatcher: a [`Subscriber`] carries nothing but
//! its generated identifier and a handle back to the dispatcher, and each
//! [`Subscription`] it creates is sugar over dispatcher calls keyed by
//! `(subscriber, type)`.

use crate::dispatcher::Dispatcher;
use crate::types::{Completion, Message, SubscriberId};

/// A registered consumer identity.
///
/// Created by [`Dispatcher::create_subscriber`]; identifiers are unique
/// per dispatcher instance.
#[derive(Clone, Debug)]
pub struct Subscriber {
    id: SubscriberId,
    dispatcher: Dispatcher,
}

impl Subscriber {
    pub(crate) fn new(id: SubscriberId, dispatcher: Dispatcher) -> Self {
        Self { id, dispatcher }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Register a handler for one message type and return the bound
    /// subscription handle. Completion is signalled through the handle.
    pub fn subscribe(
        &self,
        message_type: &str,
        concurrency: usize,
        handler: impl Fn(Message) + Send + Sync + 'static,
    ) -> Subscription {
        self.dispatcher
            .subscribe(self.id, message_type, concurrency, handler);
        Subscription {
            subscriber: self.id,
            message_type: message_type.to_string(),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Like [`subscribe`](Subscriber::subscribe), but the handler receives
    /// a per-message [`Completion`] instead of using the handle.
    pub fn subscribe_with_completion(
        &self,
        message_type: &str,
        concurrency: usize,
        handler: impl Fn(Message, Completion) + Send + Sync + 'static,
    ) -> Subscription {
        self.dispatcher
            .subscribe_with_completion(self.id, message_type, concurrency, handler);
        Subscription {
            subscriber: self.id,
            message_type: message_type.to_string(),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Remove every subscription this subscriber holds.
    pub fn unsubscribe_all(&self) {
        self.dispatcher.unsubscribe(self.id, None);
    }
}

/// Handle to one `(subscriber, type)` binding.
#[derive(Clone, Debug)]
pub struct Subscription {
    subscriber: SubscriberId,
    message_type: String,
    dispatcher: Dispatcher,
}

impl Subscription {
    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Remove the records for this binding. Removing while messages are in
    /// flight drops their counters with the records.
    pub fn unsubscribe(&self) {
        self.dispatcher
            .unsubscribe(self.subscriber, Some(&self.message_type));
    }

    /// Release one in-flight slot on this binding.
    pub fn complete(&self) {
        self.dispatcher.complete(self.subscriber, &self.message_type);
    }
}
