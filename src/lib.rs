//! # Courier
//!
//! A single-process message dispatcher: it periodically pulls messages of
//! requested types from an external source and hands each one to exactly
//! one waiting subscription, honoring per-subscription concurrency limits
//! and distributing work fairly (round-robin) across subscriptions that
//! compete for the same message type.
//!
//! ## Core Concepts
//!
//! - **Subscriptions**: `(subscriber, type, concurrency)` bindings with an
//!   independent in-flight counter; *waiting* while below their limit
//! - **Dealing**: matching one message to the least recently served
//!   waiting subscription of its type
//! - **Pull scheduling**: a recurring check that asks the source only for
//!   types something can consume, guarded against overlapping pulls
//! - **Completion**: the consumer's signal that a dealt message is done,
//!   freeing a concurrency slot
//!
//! There is no durability, redelivery, or transport: the pull source is
//! opaque and caller-supplied, and all state is in-memory.
//!
//! ## Example
//!
//! ```ignore
//! use courier::{Dispatcher, DispatcherConfig};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(DispatcherConfig {
//!     messages: vec![json!({"type": "greeting", "text": "hello"})],
//!     ..Default::default()
//! })?;
//!
//! let subscriber = dispatcher.create_subscriber();
//! let subscription = subscriber.subscribe("greeting", 1, |message| {
//!     println!("got {}", message["text"]);
//! });
//!
//! dispatcher.check();
//! subscription.complete();
//! ```

pub mod dispatcher;
pub mod error;
pub mod handles;
pub mod registry;
pub mod scheduler;
pub mod selector;
pub mod types;

// Re-exports
pub use dispatcher::{Dispatcher, DispatcherConfig, PullErrorHook, UnmatchedPolicy};
pub use error::{DispatchError, Result};
pub use handles::{Subscriber, Subscription};
pub use registry::{Handler, SubscriptionInfo, SubscriptionRegistry};
pub use scheduler::PullFn;
pub use selector::TypeSelector;
pub use types::{Completion, Message, SubscriberId};
