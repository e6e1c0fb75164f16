//! Weft Core
//!
//! This crate provides the invalidation and component-lifecycle runtime at
//! the heart of the Weft reactive UI framework. It implements:
//!
//! - Versioned dependency nodes with durable/transient subscriptions
//! - The component state machine and shared behavior descriptors
//! - Frame-synchronized update batching
//!
//! The virtual-tree renderer and the host environment stay behind traits:
//! this core decides *when* a component re-renders, never *how*.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `invalidate`: dependency tracking — invalidators, subscriptions, and
//!   the unordered sets both sides store them in
//! - `component`: component instances, descriptors, and lifecycle flags
//! - `sched`: the logical clock and frame scheduler
//! - `render`: the renderer-facing interface
//! - `error`: the invariant-violation taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_core::component::{Component, ComponentDescriptor};
//! use weft_core::invalidate::Invalidator;
//! use weft_core::sched::FrameScheduler;
//!
//! let scheduler = Arc::new(FrameScheduler::new());
//! let model = Invalidator::new(scheduler.clone());
//!
//! let descriptor = Arc::new(ComponentDescriptor::new("App").with_update(|c| {
//!     // read the model, render, hand the new root to c.sync_vroot(...)
//! }));
//!
//! let app = Component::create(descriptor, None, None, None, host, scheduler.clone());
//! app.attach();
//! app.update();                 // first render
//! app.subscribe(&model);
//!
//! scheduler.advance();
//! model.invalidate();           // app goes dirty, queued for next frame
//! scheduler.flush();            // app re-renders exactly once
//! ```

pub mod component;
pub mod error;
pub mod invalidate;
pub mod render;
pub mod sched;

pub use component::{Component, ComponentDescriptor};
pub use invalidate::{Invalidator, InvalidatorSubscription};
pub use sched::FrameScheduler;
