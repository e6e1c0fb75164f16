//! Subscription Sets
//!
//! Both sides of the subscription graph (invalidators and components) keep
//! their subscriptions in a [`SubscriptionSet`]: a semantically unordered
//! set with O(1) insert and O(1) removal.
//!
//! # Contract
//!
//! - Identity, not position, is meaningful. Removal swaps the removed entry
//!   with the last one, so callers must never rely on iteration order or on
//!   the stability of any entry's position.
//!
//! - The backing storage keeps the common 0/1-subscriber case inline and
//!   allocation-free. Only set-level operations are exposed; the internal
//!   shape is not observable.

use std::sync::Arc;

use smallvec::SmallVec;

use super::subscription::InvalidatorSubscription;

/// An unordered set of shared subscriptions.
///
/// Membership is by `Arc` identity.
#[derive(Default)]
pub struct SubscriptionSet {
    entries: SmallVec<[Arc<InvalidatorSubscription>; 1]>,
}

impl SubscriptionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// True iff the set holds no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of subscriptions in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append a subscription. O(1) amortized.
    pub fn add(&mut self, subscription: Arc<InvalidatorSubscription>) {
        self.entries.push(subscription);
    }

    /// Remove a subscription by identity.
    ///
    /// Swap-remove: the last entry takes the removed entry's slot. Returns
    /// false when the subscription is not present.
    pub fn remove(&mut self, subscription: &Arc<InvalidatorSubscription>) -> bool {
        match self
            .entries
            .iter()
            .position(|entry| Arc::ptr_eq(entry, subscription))
        {
            Some(index) => {
                self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// True iff the set contains the subscription (by identity).
    pub fn contains(&self, subscription: &Arc<InvalidatorSubscription>) -> bool {
        self.entries
            .iter()
            .any(|entry| Arc::ptr_eq(entry, subscription))
    }

    /// Clone the current entries for snapshot iteration.
    ///
    /// Safe to walk while the live set is mutated by handlers.
    pub fn snapshot(&self) -> Vec<Arc<InvalidatorSubscription>> {
        self.entries.iter().cloned().collect()
    }

    /// Take every entry out of the set, leaving it empty.
    pub fn take_all(&mut self) -> Vec<Arc<InvalidatorSubscription>> {
        self.entries.drain(..).collect()
    }
}

impl std::fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("len", &self.len())
            .finish()
    }
}
