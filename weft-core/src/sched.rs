//! Frame Scheduler
//!
//! The scheduler owns the logical clock and the per-frame update queues.
//! Components never update themselves when invalidated; they register with
//! the scheduler and are updated in a single batch when the frame is flushed.
//!
//! # How Batching Works
//!
//! 1. A data change invalidates an [`Invalidator`](crate::invalidate::Invalidator),
//!    which marks its subscriber components dirty.
//!
//! 2. Each newly-dirty component registers itself on the next-frame queue
//!    exactly once (the dirty flag is the level trigger).
//!
//! 3. `flush` drains the queue in parent-first (depth ascending) order and
//!    calls `update` on every live entry. Parents update first so a parent
//!    re-render that replaces a child never runs after that child updated.
//!
//! 4. `advance` bumps the logical clock. Invalidation waves deduplicate
//!    against this clock, so any number of invalidations between two
//!    advances collapse into one notification wave.
//!
//! Queue entries are weak references: a component dropped or disposed while
//! queued simply falls out of the batch.
//!
//! The core only consumes the [`Clock`] and [`Scheduler`] traits;
//! [`FrameScheduler`] is the default collaborator and the test harness
//! driver. Frameworks embedding this core can supply their own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::component::Component;

/// Logical frame time. Monotonic, starts at 0.
pub type Tick = u64;

/// Read-only access to the scheduler's logical clock.
pub trait Clock: Send + Sync {
    /// The current logical time.
    fn now(&self) -> Tick;
}

/// The frame scheduler consumed by components.
///
/// `Clock` is a supertrait: everything that can schedule work can also tell
/// the time, and invalidators only need the latter.
pub trait Scheduler: Clock {
    /// Register a component for a single batched update on the next flush.
    fn enqueue_update(&self, component: &Arc<Component>);

    /// Register a component for a recurring update on every flush.
    fn start_update_each_frame(&self, component: &Arc<Component>);
}

/// The default frame scheduler.
///
/// # Example
///
/// ```rust,ignore
/// let scheduler = Arc::new(FrameScheduler::new());
///
/// scheduler.advance();   // move the clock to the next tick
/// invalidator.invalidate();
/// scheduler.flush();     // run the batched component updates
/// ```
pub struct FrameScheduler {
    /// The logical clock. Only `advance` moves it.
    clock: AtomicU64,

    /// Components waiting for a single next-frame update.
    queue: Mutex<Vec<Weak<Component>>>,

    /// Components in continuous per-frame update mode.
    recurring: Mutex<Vec<Weak<Component>>>,
}

impl FrameScheduler {
    /// Create a new scheduler with the clock at 0 and empty queues.
    pub fn new() -> Self {
        Self {
            clock: AtomicU64::new(0),
            queue: Mutex::new(Vec::new()),
            recurring: Mutex::new(Vec::new()),
        }
    }

    /// Advance the logical clock by one tick and return the new value.
    pub fn advance(&self) -> Tick {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of components currently waiting on the next-frame queue.
    ///
    /// Dead entries count until the next flush.
    pub fn pending_updates(&self) -> usize {
        self.queue.lock().len()
    }

    /// Flush one frame.
    ///
    /// Drains the next-frame queue and updates every live entry in depth
    /// order, then runs every continuous-mode component. Entries whose
    /// component was dropped, disposed, or stopped continuous mode are
    /// dequeued here; dequeuing clears the component's in-queue marker.
    pub fn flush(&self) {
        let queued = std::mem::take(&mut *self.queue.lock());
        let mut batch: Vec<Arc<Component>> = queued.iter().filter_map(Weak::upgrade).collect();
        batch.sort_by_key(|c| c.depth());

        tracing::trace!(tick = self.now(), components = batch.len(), "frame flush");

        for component in &batch {
            component.update();
        }

        // Continuous-mode components. Prune entries that stopped or died
        // before running the survivors, so a stop takes effect on the very
        // next frame.
        let mut recurring = self.recurring.lock();
        recurring.retain(|weak| match weak.upgrade() {
            Some(c) => {
                if c.is_update_each_frame() && !c.is_disposed() {
                    true
                } else {
                    c.clear_in_update_queue();
                    false
                }
            }
            None => false,
        });
        let mut each_frame: Vec<Arc<Component>> =
            recurring.iter().filter_map(Weak::upgrade).collect();
        drop(recurring);

        each_frame.sort_by_key(|c| c.depth());
        for component in &each_frame {
            component.frame_update();
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FrameScheduler {
    fn now(&self) -> Tick {
        self.clock.load(Ordering::Relaxed)
    }
}

impl Scheduler for FrameScheduler {
    fn enqueue_update(&self, component: &Arc<Component>) {
        let mut queue = self.queue.lock();

        // The dirty flag already guarantees one registration per component,
        // but a foreign scheduler handing us the same component twice must
        // not double-update it.
        let id = component.id();
        if queue
            .iter()
            .filter_map(Weak::upgrade)
            .any(|c| c.id() == id)
        {
            return;
        }

        queue.push(Arc::downgrade(component));
    }

    fn start_update_each_frame(&self, component: &Arc<Component>) {
        self.recurring.lock().push(Arc::downgrade(component));
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("clock", &self.now())
            .field("pending_updates", &self.pending_updates())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_zero_and_advances() {
        let scheduler = FrameScheduler::new();
        assert_eq!(scheduler.now(), 0);

        assert_eq!(scheduler.advance(), 1);
        assert_eq!(scheduler.advance(), 2);
        assert_eq!(scheduler.now(), 2);
    }

    #[test]
    fn flush_on_empty_queues_is_a_no_op() {
        let scheduler = FrameScheduler::new();
        scheduler.flush();
        assert_eq!(scheduler.pending_updates(), 0);
    }

    #[test]
    fn dead_entries_fall_out_on_flush() {
        use crate::component::ComponentDescriptor;

        let scheduler = Arc::new(FrameScheduler::new());
        {
            let descriptor = Arc::new(ComponentDescriptor::new("Ephemeral"));
            let component = Component::create(
                descriptor,
                None,
                None,
                None,
                Arc::new(()),
                scheduler.clone(),
            );
            scheduler.enqueue_update(&component);
            assert_eq!(scheduler.pending_updates(), 1);
            // component dropped here
        }

        scheduler.flush();
        assert_eq!(scheduler.pending_updates(), 0);
    }

    #[test]
    fn enqueue_deduplicates_by_component() {
        use crate::component::ComponentDescriptor;

        let scheduler = Arc::new(FrameScheduler::new());
        let descriptor = Arc::new(ComponentDescriptor::new("Once"));
        let component = Component::create(
            descriptor,
            None,
            None,
            None,
            Arc::new(()),
            scheduler.clone(),
        );

        scheduler.enqueue_update(&component);
        scheduler.enqueue_update(&component);
        scheduler.enqueue_update(&component);

        assert_eq!(scheduler.pending_updates(), 1);
    }
}
