//! Invalidator Subscriptions
//!
//! A subscription is an immutable binding between one
//! [`Invalidator`](super::Invalidator) and one subscriber: either a
//! zero-argument callback or a [`Component`](crate::component::Component).
//! It is created by the invalidator's subscribe entry points and shared by
//! `Arc` between the invalidator's set and, for component subscribers, the
//! component's mirrored set.
//!
//! # Cancellation
//!
//! A subscription is canceled exactly once, through one of three paths:
//!
//! - [`cancel`](InvalidatorSubscription::cancel): explicit, removes the
//!   subscription from both sides.
//! - Transient consumption: the invalidator takes the whole transient set
//!   during an invalidation wave, detaches each entry from its subscriber's
//!   mirror, and notifies it one last time.
//! - Subscriber-side cancellation: a component canceling its own sets has
//!   already cleared its mirror and only detaches the invalidator side.
//!
//! Whichever path runs first marks the subscription canceled; a canceled
//! subscription is never notified again, and canceling it a second time is
//! a debug-build invariant violation.
//!
//! Both back-references are weak: the subscription graph never keeps an
//! invalidator or a component alive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::component::Component;
use crate::error::{invariant, InvariantError};

use super::Invalidator;

/// Subscriber kind and durability of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionFlags {
    /// The subscriber is a component (false: a plain callback).
    pub component: bool,

    /// Consumed by the first actual invalidation wave (false: durable).
    pub transient: bool,
}

/// The notification target of a subscription.
enum SubscriberTarget {
    /// A component to invalidate.
    Component(Weak<Component>),

    /// A plain callback to invoke.
    Callback(Box<dyn Fn() + Send + Sync>),
}

/// A canceled-once binding from an invalidator to a subscriber.
pub struct InvalidatorSubscription {
    flags: SubscriptionFlags,

    /// The invalidator this subscription is attached to.
    invalidator: Weak<Invalidator>,

    target: SubscriberTarget,

    /// Set by the first cancellation path that runs.
    canceled: AtomicBool,
}

impl InvalidatorSubscription {
    /// Create a callback-flavored subscription.
    pub(crate) fn callback(
        invalidator: Weak<Invalidator>,
        transient: bool,
        callback: Box<dyn Fn() + Send + Sync>,
    ) -> Self {
        Self {
            flags: SubscriptionFlags {
                component: false,
                transient,
            },
            invalidator,
            target: SubscriberTarget::Callback(callback),
            canceled: AtomicBool::new(false),
        }
    }

    /// Create a component-flavored subscription.
    pub(crate) fn component(
        invalidator: Weak<Invalidator>,
        transient: bool,
        component: Weak<Component>,
    ) -> Self {
        Self {
            flags: SubscriptionFlags {
                component: true,
                transient,
            },
            invalidator,
            target: SubscriberTarget::Component(component),
            canceled: AtomicBool::new(false),
        }
    }

    /// Subscriber kind and durability.
    pub fn flags(&self) -> SubscriptionFlags {
        self.flags
    }

    /// True once any cancellation path has run.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Notify the subscriber.
    ///
    /// Component subscribers are invalidated; callback subscribers are
    /// invoked. A subscription canceled earlier in the same wave is skipped:
    /// once canceled, never invalidated.
    pub fn invalidate(&self) {
        if self.is_canceled() {
            return;
        }
        self.dispatch();
    }

    /// Cancel this subscription, removing it from the invalidator's set and
    /// — for a component subscriber — from the component's mirrored set.
    ///
    /// Canceling twice is a debug-build invariant violation.
    pub fn cancel(self: &Arc<Self>) {
        self.mark_canceled();
        if let Some(invalidator) = self.invalidator.upgrade() {
            invalidator.remove_subscription(self);
        }
        if let SubscriberTarget::Component(weak) = &self.target {
            if let Some(component) = weak.upgrade() {
                component.remove_subscription(self);
            }
        }
    }

    /// Transient consumption: the invalidator already took this entry out of
    /// its own set. Detach the subscriber mirror, then deliver the final
    /// notification.
    pub(crate) fn consume(self: &Arc<Self>) {
        self.mark_canceled();
        if let SubscriberTarget::Component(weak) = &self.target {
            if let Some(component) = weak.upgrade() {
                component.remove_subscription(self);
            }
        }
        self.dispatch();
    }

    /// Subscriber-side cancellation: the component already cleared its
    /// mirror. Only the invalidator side remains.
    pub(crate) fn detach_from_invalidator(self: &Arc<Self>) {
        self.mark_canceled();
        if let Some(invalidator) = self.invalidator.upgrade() {
            invalidator.remove_subscription(self);
        }
    }

    fn mark_canceled(&self) {
        let was_canceled = self.canceled.swap(true, Ordering::AcqRel);
        invariant!(!was_canceled, InvariantError::SubscriptionAlreadyCanceled);
    }

    fn dispatch(&self) {
        match &self.target {
            SubscriberTarget::Component(weak) => {
                if let Some(component) = weak.upgrade() {
                    component.invalidate();
                }
            }
            SubscriberTarget::Callback(callback) => callback(),
        }
    }
}

impl std::fmt::Debug for InvalidatorSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidatorSubscription")
            .field("flags", &self.flags)
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn invalidate_invokes_callback() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let sub = Arc::new(InvalidatorSubscription::callback(
            Weak::new(),
            false,
            Box::new(move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        ));

        sub.invalidate();
        sub.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn canceled_subscription_is_never_notified() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let sub = Arc::new(InvalidatorSubscription::callback(
            Weak::new(),
            false,
            Box::new(move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        ));

        sub.cancel();
        assert!(sub.is_canceled());

        sub.invalidate();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "subscription already canceled")]
    fn double_cancel_is_an_invariant_violation() {
        let sub = Arc::new(InvalidatorSubscription::callback(
            Weak::new(),
            false,
            Box::new(|| {}),
        ));

        sub.cancel();
        sub.cancel();
    }

    #[test]
    fn flags_describe_kind_and_durability() {
        let transient = InvalidatorSubscription::callback(Weak::new(), true, Box::new(|| {}));
        assert!(transient.flags().transient);
        assert!(!transient.flags().component);

        let durable = InvalidatorSubscription::component(Weak::new(), false, Weak::new());
        assert!(!durable.flags().transient);
        assert!(durable.flags().component);
    }

    #[test]
    fn dead_component_target_is_ignored() {
        // The component behind the subscription is gone; notification and
        // cancellation must both be no-ops rather than errors.
        let sub = Arc::new(InvalidatorSubscription::component(
            Weak::new(),
            false,
            Weak::new(),
        ));

        sub.invalidate();
        sub.cancel();
        assert!(sub.is_canceled());
    }
}
