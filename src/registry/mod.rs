//! Subscription registry and fairness dealing.
//!
//! The registry is an ordered sequence of subscription records; its order
//! *is* the round-robin state. Dealing picks the first waiting record that
//! matches a message's type and rotates it to the tail, so competing
//! subscriptions on one type take turns.
//!
//! # Example
//!
//! ```ignore
//! let registry = SubscriptionRegistry::new();
//! registry.subscribe(SubscriberId(1), "order", 2, handler);
//!
//! if let Some(dealt) = registry.deal("order") {
//!     // invoke dealt.handler outside the registry
//! }
//!
//! registry.complete(SubscriberId(1), "order");
//! ```

mod manager;
mod types;

pub use manager::SubscriptionRegistry;
pub use types::{Handler, SubscriptionInfo};
