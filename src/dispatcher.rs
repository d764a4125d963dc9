//! Main Dispatcher struct tying all components together.

use crate::error::{DispatchError, Result};
use crate::handles::Subscriber;
use crate::registry::{Handler, SubscriptionInfo, SubscriptionRegistry};
use crate::scheduler::{PendingBuffer, PullFn, PullScheduler, PullSource};
use crate::selector::TypeSelector;
use crate::types::{Completion, Message, SubscriberId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Observer for pull-source failures. Errors are logged and swallowed
/// either way; the hook exists so a host can count or surface them.
pub type PullErrorHook = Arc<dyn Fn(&DispatchError) + Send + Sync>;

/// What to do with a message no waiting subscription matches.
#[derive(Clone)]
pub enum UnmatchedPolicy {
    /// Discard the message. The original dispatcher behavior.
    Drop,
    /// Append the message to the pending buffer so a later check can
    /// retry it. Only meaningful with the default buffer source.
    Requeue,
    /// Hand the message to a dead-letter sink.
    DeadLetter(Arc<dyn Fn(Message) + Send + Sync>),
}

impl fmt::Debug for UnmatchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedPolicy::Drop => f.write_str("UnmatchedPolicy::Drop"),
            UnmatchedPolicy::Requeue => f.write_str("UnmatchedPolicy::Requeue"),
            UnmatchedPolicy::DeadLetter(_) => f.write_str("UnmatchedPolicy::DeadLetter(..)"),
        }
    }
}

/// Dispatcher configuration.
pub struct DispatcherConfig {
    /// External pull source. When absent, messages are served from the
    /// in-process pending buffer.
    pub pull: Option<PullFn>,

    /// Interval between scheduled checks. Default: 1s.
    pub interval: Duration,

    /// Initial contents of the pending buffer (only meaningful without an
    /// external `pull`).
    pub messages: Vec<Message>,

    /// How a message's type tag is extracted. Default: the `"type"` field.
    pub type_selector: TypeSelector,

    /// Start the scheduler right after construction.
    pub start: bool,

    /// Routing for messages with no waiting subscription.
    pub unmatched: UnmatchedPolicy,

    /// Optional observer for pull-source errors.
    pub on_pull_error: Option<PullErrorHook>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pull: None,
            interval: Duration::from_millis(1000),
            messages: Vec::new(),
            type_selector: TypeSelector::default(),
            start: false,
            unmatched: UnmatchedPolicy::Drop,
            on_pull_error: None,
        }
    }
}

struct DispatcherCore {
    registry: SubscriptionRegistry,
    selector: TypeSelector,
    source: PullSource,
    buffer: PendingBuffer,
    scheduler: PullScheduler,
    unmatched: UnmatchedPolicy,
    on_pull_error: Option<PullErrorHook>,
    /// Owned by this instance; no process-global state.
    next_subscriber: AtomicU64,
}

/// The message dispatcher.
///
/// Periodically pulls messages of the types waiting subscriptions can
/// consume and deals each one to exactly one subscription, round-robin
/// among those competing for the same type and bounded by each record's
/// concurrency limit.
///
/// Cloning is cheap and shares the underlying state, so handles and timer
/// threads all act on one registry.
#[derive(Clone)]
pub struct Dispatcher {
    core: Arc<DispatcherCore>,
}

impl Dispatcher {
    /// Create a dispatcher from configuration.
    ///
    /// Fails on a zero interval. With `start: true` the scheduler is armed
    /// before this returns; its first check runs on the timer thread.
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(DispatchError::Config(
                "interval must be positive".to_string(),
            ));
        }

        let source = match config.pull {
            Some(f) => PullSource::External(f),
            None => PullSource::Buffer,
        };

        let dispatcher = Self {
            core: Arc::new(DispatcherCore {
                registry: SubscriptionRegistry::new(),
                selector: config.type_selector,
                source,
                buffer: PendingBuffer::new(config.messages),
                scheduler: PullScheduler::new(config.interval),
                unmatched: config.unmatched,
                on_pull_error: config.on_pull_error,
                next_subscriber: AtomicU64::new(1),
            }),
        };

        if config.start {
            dispatcher.start();
        }
        Ok(dispatcher)
    }

    /// Dispatcher with all defaults: buffer source, 1s interval, unstarted.
    pub fn with_defaults() -> Self {
        // Default interval is non-zero, so this cannot fail
        Self::new(DispatcherConfig::default()).expect("default config is valid")
    }

    /// Create a subscriber handle with a fresh identifier.
    pub fn create_subscriber(&self) -> Subscriber {
        let id = SubscriberId(self.core.next_subscriber.fetch_add(1, Ordering::SeqCst));
        Subscriber::new(id, self.clone())
    }

    /// Register a handler that signals completion through its
    /// [`Subscription`](crate::handles::Subscription) handle.
    pub fn subscribe(
        &self,
        subscriber: SubscriberId,
        message_type: &str,
        concurrency: usize,
        handler: impl Fn(Message) + Send + Sync + 'static,
    ) {
        self.core.registry.subscribe(
            subscriber,
            message_type,
            concurrency,
            Handler::Simple(Arc::new(handler)),
        );
    }

    /// Register a handler that receives a single-use [`Completion`] bound
    /// to the exact record each message is dealt to.
    pub fn subscribe_with_completion(
        &self,
        subscriber: SubscriberId,
        message_type: &str,
        concurrency: usize,
        handler: impl Fn(Message, Completion) + Send + Sync + 'static,
    ) {
        self.core.registry.subscribe(
            subscriber,
            message_type,
            concurrency,
            Handler::WithCompletion(Arc::new(handler)),
        );
    }

    /// Remove a subscriber's records, all of them or only those for one
    /// type. Unknown subscribers are a silent no-op.
    pub fn unsubscribe(&self, subscriber: SubscriberId, message_type: Option<&str>) {
        let removed = self.core.registry.unsubscribe(subscriber, message_type);
        if removed > 0 {
            debug!(%subscriber, ?message_type, removed, "unsubscribed");
        }
    }

    /// Release one concurrency slot on the first in-flight record matching
    /// both keys. A freed slot may make a pull worthwhile, so a successful
    /// completion re-triggers a check; completing a subscription that is
    /// not in flight is a silent no-op.
    pub fn complete(&self, subscriber: SubscriberId, message_type: &str) {
        if self.core.registry.complete(subscriber, message_type) {
            self.check();
        }
    }

    /// Read-only snapshot of all subscriptions, in fairness order.
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.core.registry.snapshot()
    }

    /// Append a message to the pending buffer. Unused (though accepted)
    /// when an external pull source is configured.
    pub fn push(&self, message: Message) {
        self.core.buffer.push(message);
    }

    /// Ask the source for work if anything can consume it.
    ///
    /// Re-entrancy is guarded by the in-flight flag: while a pull is
    /// outstanding this call is a no-op. When the waiting-type set is
    /// empty the source is not touched at all. Each successfully pulled
    /// message is dealt and followed by an eager re-check, since a
    /// successful pull suggests more work is immediately available.
    pub fn check(&self) {
        loop {
            if !self.core.scheduler.try_begin() {
                return;
            }

            let waiting = self.core.registry.waiting_types();
            if waiting.is_empty() {
                self.core.scheduler.finish();
                return;
            }

            let pulled = match &self.core.source {
                PullSource::External(pull) => pull(&waiting),
                PullSource::Buffer => {
                    Ok(self.core.buffer.take_matching(&waiting, &self.core.selector))
                }
            };
            self.core.scheduler.finish();

            match pulled {
                Ok(Some(message)) => self.deal(message),
                Ok(None) => return,
                Err(e) => {
                    warn!(error = %e, "pull source failed");
                    if let Some(hook) = &self.core.on_pull_error {
                        hook(&e);
                    }
                    return;
                }
            }
        }
    }

    /// Arm the recurring check timer. Idempotent; the timer thread is
    /// detached and never keeps the process alive on its own.
    pub fn start(&self) {
        let dispatcher = self.clone();
        self.core.scheduler.start(move || dispatcher.check());
    }

    /// Cancel the timer and mark the scheduler unstarted. A second `stop`
    /// is a no-op; manual `check` calls keep working afterwards.
    pub fn stop(&self) {
        self.core.scheduler.stop();
    }

    /// Deal one message to at most one waiting subscription.
    fn deal(&self, message: Message) {
        let Some(tag) = self.core.selector.select(&message) else {
            debug!("message without type tag");
            self.unmatched(message);
            return;
        };

        match self.core.registry.deal(&tag) {
            Some(dealt) => {
                debug!(message_type = %tag, subscriber = %dealt.subscriber, "dealing message");
                match dealt.handler {
                    Handler::Simple(handler) => handler(message),
                    Handler::WithCompletion(handler) => {
                        let dispatcher = self.clone();
                        let subscriber = dealt.subscriber;
                        let message_type = dealt.message_type;
                        let completion = Completion::new(move || {
                            dispatcher.complete(subscriber, &message_type);
                        });
                        handler(message, completion);
                    }
                }
            }
            None => {
                debug!(message_type = %tag, "no waiting subscription");
                self.unmatched(message);
            }
        }
    }

    fn unmatched(&self, message: Message) {
        match &self.core.unmatched {
            UnmatchedPolicy::Drop => {}
            UnmatchedPolicy::Requeue => self.core.buffer.push(message),
            UnmatchedPolicy::DeadLetter(sink) => sink(message),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscriptions", &self.core.registry.len())
            .field("started", &self.core.scheduler.is_started())
            .finish()
    }
}
