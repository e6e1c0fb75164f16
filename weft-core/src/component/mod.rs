//! Component Lifecycle
//!
//! This module implements the consumer half of the invalidation graph: live
//! [`Component`] instances and the shared [`ComponentDescriptor`] behavior
//! templates they dispatch through.
//!
//! # Concepts
//!
//! ## Descriptors
//!
//! A component "kind" is one descriptor: a flyweight struct of optional
//! hooks (init, data/children assignment, update, invalidated, attach,
//! detach, disposed). Every instance of the kind shares it by `Arc`; there
//! is no subclass hierarchy.
//!
//! ## Instances
//!
//! A component owns its lifecycle flag record, its rendered subtree root,
//! and its mirrored subscription sets. Invalidation marks it dirty and
//! batches an update onto the next frame; the frame flush re-renders it at
//! most once no matter how many dependencies fired.
//!
//! ## Flags
//!
//! Lifecycle states are independent booleans combined by an injected
//! readiness predicate; `disposed` is terminal.

mod descriptor;
mod flags;
mod instance;

pub use descriptor::{ComponentDescriptor, Hook, Payload, PayloadHook};
pub use flags::{default_ready_to_update, LifecycleFlags, ReadyPredicate};
pub use instance::Component;
