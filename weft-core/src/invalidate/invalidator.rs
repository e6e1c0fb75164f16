//! Invalidator Implementation
//!
//! An [`Invalidator`] is a versioned dependency node: the piece of data it
//! stands for has a last-modified logical time, and anything that read the
//! data can subscribe to hear about the next change.
//!
//! # How Invalidation Works
//!
//! 1. `invalidate()` reads the scheduler's logical clock. If this node was
//!    already invalidated at the current tick, the call is a no-op: any
//!    number of invalidations within one tick collapse into a single
//!    notification wave.
//!
//! 2. On an actual wave, `mtime` is stamped first, then every durable
//!    subscription is notified from a snapshot of the set. A handler that
//!    cancels another subscription mid-wave mutates the live set, not the
//!    snapshot; the canceled entry is skipped when the walk reaches it.
//!
//! 3. The transient set is then taken and cleared in one step, and each
//!    taken entry is consumed: detached from its subscriber's mirror and
//!    notified one final time. Transient subscribers re-subscribe on their
//!    next render to whatever they read.
//!
//! The durable/transient split is the reason components can track "whatever
//! the last render touched" without accumulating stale subscriptions:
//! stable dependencies subscribe durably once, per-render reads subscribe
//! transiently every time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{invariant, InvariantError};
use crate::sched::{Clock, Tick};

use super::set::SubscriptionSet;
use super::subscription::InvalidatorSubscription;

/// Counter for generating unique invalidator IDs.
static INVALIDATOR_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique invalidator ID.
fn next_invalidator_id() -> u64 {
    INVALIDATOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A versioned dependency node with durable and transient subscriber sets.
///
/// # Example
///
/// ```rust,ignore
/// let scheduler = Arc::new(FrameScheduler::new());
/// let invalidator = Invalidator::new(scheduler.clone());
///
/// let sub = invalidator.subscribe(|| println!("changed"));
///
/// scheduler.advance();
/// invalidator.invalidate();   // prints "changed"
/// invalidator.invalidate();   // same tick: deduplicated, silent
/// ```
pub struct Invalidator {
    /// Unique identifier for this invalidator.
    id: u64,

    /// The scheduler's logical clock.
    clock: Arc<dyn Clock>,

    /// Logical time of the last actual invalidation. Monotonic.
    mtime: AtomicU64,

    /// Subscriptions that persist until explicitly canceled.
    subscriptions: RwLock<SubscriptionSet>,

    /// Subscriptions consumed by the next actual invalidation wave.
    transient_subscriptions: RwLock<SubscriptionSet>,
}

impl Invalidator {
    /// Create a new invalidator stamped with the clock's current time.
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        let now = clock.now();
        Arc::new(Self {
            id: next_invalidator_id(),
            clock,
            mtime: AtomicU64::new(now),
            subscriptions: RwLock::new(SubscriptionSet::new()),
            transient_subscriptions: RwLock::new(SubscriptionSet::new()),
        })
    }

    /// Get the invalidator's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Logical time of the last actual invalidation.
    pub fn mtime(&self) -> Tick {
        self.mtime.load(Ordering::Acquire)
    }

    /// True iff either subscription set is non-empty. Pure query.
    pub fn has_subscriptions(&self) -> bool {
        !self.subscriptions.read().is_empty() || !self.transient_subscriptions.read().is_empty()
    }

    /// Durable subscription with a plain callback subscriber.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Arc<InvalidatorSubscription>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let sub = Arc::new(InvalidatorSubscription::callback(
            Arc::downgrade(self),
            false,
            Box::new(callback),
        ));
        self.add_subscription(sub.clone());
        sub
    }

    /// Transient subscription with a plain callback subscriber: consumed by
    /// the next actual invalidation wave.
    pub fn transient_subscribe<F>(self: &Arc<Self>, callback: F) -> Arc<InvalidatorSubscription>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let sub = Arc::new(InvalidatorSubscription::callback(
            Arc::downgrade(self),
            true,
            Box::new(callback),
        ));
        self.add_subscription(sub.clone());
        sub
    }

    /// Append a subscription to the durable or transient set, per its
    /// durability flag. O(1) amortized.
    pub fn add_subscription(&self, subscription: Arc<InvalidatorSubscription>) {
        if subscription.flags().transient {
            self.transient_subscriptions.write().add(subscription);
        } else {
            self.subscriptions.write().add(subscription);
        }
    }

    /// Remove a subscription from the matching set by identity.
    ///
    /// Unordered swap-remove. Removing a subscription that is not present
    /// is a debug-build invariant violation.
    pub fn remove_subscription(&self, subscription: &Arc<InvalidatorSubscription>) {
        let removed = if subscription.flags().transient {
            self.transient_subscriptions.write().remove(subscription)
        } else {
            self.subscriptions.write().remove(subscription)
        };
        invariant!(removed, InvariantError::SubscriptionNotFound);
    }

    /// Notify subscribers of a change, at most once per clock tick.
    ///
    /// On an actual wave: stamp `mtime`, notify every durable subscription
    /// from a snapshot, then take and consume the whole transient set. When
    /// the node was already invalidated at the current tick the call is a
    /// no-op — this is the dedup guarantee that makes nested invalidations
    /// during a wave safe.
    pub fn invalidate(&self) {
        let now = self.clock.now();
        if self.mtime.load(Ordering::Acquire) >= now {
            return;
        }
        self.mtime.store(now, Ordering::Release);

        tracing::trace!(invalidator = self.id, tick = now, "invalidation wave");

        // Durable first. Snapshot so handlers can cancel other
        // subscriptions mid-wave; canceled entries skip themselves.
        let durable = self.subscriptions.read().snapshot();
        for sub in &durable {
            sub.invalidate();
        }

        // Transient set is consumed exactly once per wave.
        let transient = self.transient_subscriptions.write().take_all();
        for sub in &transient {
            sub.consume();
        }
    }
}

impl std::fmt::Debug for Invalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invalidator")
            .field("id", &self.id)
            .field("mtime", &self.mtime())
            .field("subscriptions", &self.subscriptions.read().len())
            .field(
                "transient_subscriptions",
                &self.transient_subscriptions.read().len(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    struct TestClock {
        tick: AtomicU64,
    }

    impl TestClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                tick: AtomicU64::new(0),
            })
        }

        fn advance(&self) {
            self.tick.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Tick {
            self.tick.load(Ordering::SeqCst)
        }
    }

    fn counting_callback(counter: &Arc<AtomicI32>) -> impl Fn() + Send + Sync + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn invalidator_ids_are_unique() {
        let clock = TestClock::new();
        let a = Invalidator::new(clock.clone());
        let b = Invalidator::new(clock);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn mtime_starts_at_the_current_clock() {
        let clock = TestClock::new();
        clock.advance();
        clock.advance();

        let invalidator = Invalidator::new(clock);
        assert_eq!(invalidator.mtime(), 2);
    }

    #[test]
    fn invalidations_deduplicate_within_one_tick() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        let calls = Arc::new(AtomicI32::new(0));
        let _sub = invalidator.subscribe(counting_callback(&calls));

        clock.advance();
        invalidator.invalidate();
        invalidator.invalidate();
        invalidator.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance();
        invalidator.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_without_clock_advance_is_a_no_op() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock);

        let calls = Arc::new(AtomicI32::new(0));
        let _sub = invalidator.subscribe(counting_callback(&calls));

        // mtime == clock: nothing has changed this tick.
        invalidator.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn transient_subscriptions_are_consumed_once() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        let calls = Arc::new(AtomicI32::new(0));
        let sub = invalidator.transient_subscribe(counting_callback(&calls));
        assert!(invalidator.has_subscriptions());

        clock.advance();
        invalidator.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sub.is_canceled());
        assert!(!invalidator.has_subscriptions());

        // The next wave has nothing to notify.
        clock.advance();
        invalidator.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn durable_subscriptions_persist_across_waves() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        let calls = Arc::new(AtomicI32::new(0));
        let _sub = invalidator.subscribe(counting_callback(&calls));

        for _ in 0..3 {
            clock.advance();
            invalidator.invalidate();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(invalidator.has_subscriptions());
    }

    #[test]
    fn canceled_subscription_receives_no_further_notifications() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        let canceled_calls = Arc::new(AtomicI32::new(0));
        let surviving_calls = Arc::new(AtomicI32::new(0));

        let to_cancel = invalidator.subscribe(counting_callback(&canceled_calls));
        let _survivor = invalidator.subscribe(counting_callback(&surviving_calls));

        to_cancel.cancel();

        clock.advance();
        invalidator.invalidate();

        assert_eq!(canceled_calls.load(Ordering::SeqCst), 0);
        assert_eq!(surviving_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_cancel_another_subscription_mid_wave() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        // First handler cancels the second subscription while the wave is
        // in flight; the snapshot walk must skip it.
        let victim_calls = Arc::new(AtomicI32::new(0));
        let victim = invalidator.subscribe(counting_callback(&victim_calls));

        let victim_clone = victim.clone();
        let _canceler = invalidator.subscribe(move || {
            if !victim_clone.is_canceled() {
                victim_clone.cancel();
            }
        });

        // The victim subscribed first, so it is notified before the
        // canceler runs; the second wave is the one it must miss.
        clock.advance();
        invalidator.invalidate();
        assert_eq!(victim_calls.load(Ordering::SeqCst), 1);

        clock.advance();
        invalidator.invalidate();
        assert_eq!(victim_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_invalidate_during_a_wave_is_absorbed() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        let invalidator_clone = Arc::downgrade(&invalidator);
        let _sub = invalidator.subscribe(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            // Re-entrant invalidation on the same node: same tick, no-op.
            if let Some(inv) = invalidator_clone.upgrade() {
                inv.invalidate();
            }
        });

        clock.advance();
        invalidator.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "subscription not present")]
    fn removing_an_unknown_subscription_is_an_invariant_violation() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());
        let other = Invalidator::new(clock);

        let sub = other.subscribe(|| {});
        invalidator.remove_subscription(&sub);
    }

    #[test]
    fn mtime_is_monotonically_non_decreasing() {
        let clock = TestClock::new();
        let invalidator = Invalidator::new(clock.clone());

        let mut last = invalidator.mtime();
        for _ in 0..4 {
            clock.advance();
            invalidator.invalidate();
            let mtime = invalidator.mtime();
            assert!(mtime >= last);
            last = mtime;
        }
    }
}
