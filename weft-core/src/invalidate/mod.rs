//! Invalidation Graph
//!
//! This module implements the dependency-tracking half of the runtime:
//! versioned [`Invalidator`] nodes, the [`InvalidatorSubscription`] bindings
//! that connect them to subscribers, and the unordered [`SubscriptionSet`]
//! both sides store those bindings in.
//!
//! # Concepts
//!
//! ## Invalidators
//!
//! An invalidator stands for a piece of data something might depend on.
//! When the data changes, `invalidate()` notifies every subscriber — at
//! most once per logical clock tick, so a burst of changes within one frame
//! collapses into a single notification wave.
//!
//! ## Durable vs. transient subscriptions
//!
//! Durable subscriptions persist until explicitly canceled; they express
//! stable, explicitly-managed dependencies. Transient subscriptions are
//! consumed by the first actual wave; a component re-creates them on every
//! render for whatever it just read, so dependencies from a previous render
//! never leak into the next one.
//!
//! ## Subscription sets
//!
//! Semantically unordered, O(1) insert, O(1) swap-remove. Identity is
//! meaningful, position is not.

mod invalidator;
mod set;
mod subscription;

pub use invalidator::Invalidator;
pub use set::SubscriptionSet;
pub use subscription::{InvalidatorSubscription, SubscriptionFlags};
