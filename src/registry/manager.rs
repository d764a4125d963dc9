//! Subscription registry with round-robin dealing.

use crate::types::SubscriberId;
use parking_lot::Mutex;

use super::types::{Dealt, Handler, SubscriptionInfo, SubscriptionRecord};

/// Ordered collection of subscription records.
///
/// Ordering is the fairness mechanism: a record that receives a message is
/// rotated to the tail, so among records matching a type the least recently
/// dealt one sits nearest the front and is picked first.
pub struct SubscriptionRegistry {
    records: Mutex<Vec<SubscriptionRecord>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Append a new subscription record.
    ///
    /// No duplicate detection: the same subscriber may register several
    /// handlers for the same type, each with its own in-flight counter.
    /// A `concurrency` of zero is normalized to one.
    pub fn subscribe(
        &self,
        subscriber: SubscriberId,
        message_type: impl Into<String>,
        concurrency: usize,
        handler: Handler,
    ) {
        let record = SubscriptionRecord {
            subscriber,
            message_type: message_type.into(),
            concurrency: concurrency.max(1),
            current: 0,
            handler,
        };
        self.records.lock().push(record);
    }

    /// Remove every record owned by `subscriber`, optionally narrowed to
    /// one message type. Removing an in-flight record drops its counter
    /// with it; the slot can no longer be completed. Returns the number
    /// of records removed (zero for an unknown subscriber).
    pub fn unsubscribe(&self, subscriber: SubscriberId, message_type: Option<&str>) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| {
            r.subscriber != subscriber
                || message_type.is_some_and(|t| r.message_type != t)
        });
        before - records.len()
    }

    /// Decrement the in-flight counter of the first record matching both
    /// keys with `current > 0`. Returns whether a counter was decremented;
    /// if nothing matches the call is a silent no-op, so an unsubscribed or
    /// fully completed subscription cannot be double-completed.
    pub fn complete(&self, subscriber: SubscriberId, message_type: &str) -> bool {
        let mut records = self.records.lock();
        for record in records.iter_mut() {
            if record.subscriber == subscriber
                && record.message_type == message_type
                && record.current > 0
            {
                record.current -= 1;
                return true;
            }
        }
        false
    }

    /// Select the subscription for a message of the given type.
    ///
    /// Picks the first waiting record whose type matches, rotates it to the
    /// tail, and increments its counter. Returns `None` when no waiting
    /// record matches. The handler clone is returned so the caller can
    /// invoke it with the lock released.
    pub(crate) fn deal(&self, message_type: &str) -> Option<Dealt> {
        let mut records = self.records.lock();
        let position = records
            .iter()
            .position(|r| r.message_type == message_type && r.is_waiting())?;

        let mut record = records.remove(position);
        record.current += 1;
        let dealt = Dealt {
            subscriber: record.subscriber,
            message_type: record.message_type.clone(),
            handler: record.handler.clone(),
        };
        records.push(record);
        Some(dealt)
    }

    /// Distinct types with at least one waiting subscription, in registry
    /// order. Duplicate types collapse; an empty result means a pull could
    /// not deliver anything.
    pub fn waiting_types(&self) -> Vec<String> {
        let records = self.records.lock();
        let mut types: Vec<String> = Vec::new();
        for record in records.iter() {
            if record.is_waiting() && !types.iter().any(|t| t == &record.message_type) {
                types.push(record.message_type.clone());
            }
        }
        types
    }

    /// Read-only snapshot of all records, in current fairness order.
    pub fn snapshot(&self) -> Vec<SubscriptionInfo> {
        self.records
            .lock()
            .iter()
            .map(|r| SubscriptionInfo {
                subscriber: r.subscriber,
                message_type: r.message_type.clone(),
                concurrency: r.concurrency,
                current: r.current,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
