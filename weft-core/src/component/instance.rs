//! Component Implementation
//!
//! A [`Component`] is a live instance of a descriptor: it owns its lifecycle
//! flags, its rendered subtree root, and its two mirrored subscription sets.
//! It does not own its parent or its descriptor.
//!
//! # Lifecycle
//!
//! 1. A factory ([`create`](Component::create) or [`mount`](Component::mount))
//!    builds the instance dirty, runs the descriptor's `init` hook, and
//!    returns it. The mount variant additionally starts in hydration mode.
//!
//! 2. The attach flow puts the component into the live tree; the first
//!    `update()` renders it (the readiness gate requires attached + dirty).
//!
//! 3. A dependency change invalidates the component: it goes dirty, drops
//!    its transient subscriptions (stale under the new data), registers for
//!    the next frame, and waits. Further invalidations before that frame
//!    are absorbed by the dirty flag.
//!
//! 4. The frame flush calls `update()`, which runs the descriptor's update
//!    hook, stamps the modification time, and clears dirty. The update hook
//!    re-renders and hands the new subtree to [`sync_vroot`](Component::sync_vroot),
//!    transiently re-subscribing to whatever the render read.
//!
//! 5. `dispose()` is terminal and not reentrant: it cancels every
//!    subscription, releases the rendered root, and runs the `disposed`
//!    hook. Disposing twice is an invariant violation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::error::{invariant, InvariantError};
use crate::invalidate::{Invalidator, InvalidatorSubscription, SubscriptionSet};
use crate::render::{Host, VRoot};
use crate::sched::{Scheduler, Tick};

use super::descriptor::{ComponentDescriptor, Payload};
use super::flags::LifecycleFlags;

/// Counter for generating unique component IDs.
static COMPONENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique component ID.
fn next_component_id() -> u64 {
    COMPONENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A live component instance.
pub struct Component {
    /// Unique identifier, monotonic for the process lifetime.
    id: u64,

    /// Distance from the tree root: `parent.depth + 1`, 0 at the root.
    /// Orders batched frame updates parent-first.
    depth: usize,

    /// The shared behavior template for this component kind.
    descriptor: Arc<ComponentDescriptor>,

    /// Back-pointer to the parent; never owned.
    parent: Option<Weak<Component>>,

    /// The frame scheduler this component batches its updates on.
    scheduler: Arc<dyn Scheduler>,

    /// Opaque host element the rendered subtree lives under.
    host: Host,

    /// Lifecycle flag record.
    flags: RwLock<LifecycleFlags>,

    /// Opaque data payload owned by the descriptor's hooks.
    data: RwLock<Option<Payload>>,

    /// Opaque children payload owned by the descriptor's hooks.
    children: RwLock<Option<Payload>>,

    /// Opaque state payload owned by the descriptor's hooks.
    state: RwLock<Option<Payload>>,

    /// The current rendered subtree root.
    root: RwLock<Option<Box<dyn VRoot>>>,

    /// Durable subscriptions, mirrored from their invalidators.
    subscriptions: RwLock<SubscriptionSet>,

    /// Transient subscriptions, canceled on every invalidation.
    transient_subscriptions: RwLock<SubscriptionSet>,

    /// Logical time of the last completed update.
    mtime: AtomicU64,
}

impl Component {
    /// Create a component.
    ///
    /// The instance starts dirty (first render pending) and detached; runs
    /// the descriptor's `init` hook synchronously before returning.
    pub fn create(
        descriptor: Arc<ComponentDescriptor>,
        data: Option<Payload>,
        children: Option<Payload>,
        parent: Option<&Arc<Component>>,
        host: Host,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        Self::instantiate(descriptor, data, children, parent, host, scheduler, false)
    }

    /// Create a component that hydrates onto pre-existing host markup.
    ///
    /// Identical to [`create`](Component::create) except the instance starts
    /// in mounting mode, which routes the first rendered root through the
    /// renderer's mount entry point.
    pub fn mount(
        descriptor: Arc<ComponentDescriptor>,
        data: Option<Payload>,
        children: Option<Payload>,
        parent: Option<&Arc<Component>>,
        host: Host,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        Self::instantiate(descriptor, data, children, parent, host, scheduler, true)
    }

    fn instantiate(
        descriptor: Arc<ComponentDescriptor>,
        data: Option<Payload>,
        children: Option<Payload>,
        parent: Option<&Arc<Component>>,
        host: Host,
        scheduler: Arc<dyn Scheduler>,
        mounting: bool,
    ) -> Arc<Self> {
        let depth = parent.map_or(0, |p| p.depth + 1);
        let mtime = scheduler.now();
        let component = Arc::new(Self {
            id: next_component_id(),
            depth,
            descriptor,
            parent: parent.map(Arc::downgrade),
            scheduler,
            host,
            flags: RwLock::new(LifecycleFlags {
                dirty: true,
                mounting,
                ..LifecycleFlags::default()
            }),
            data: RwLock::new(data),
            children: RwLock::new(children),
            state: RwLock::new(None),
            root: RwLock::new(None),
            subscriptions: RwLock::new(SubscriptionSet::new()),
            transient_subscriptions: RwLock::new(SubscriptionSet::new()),
            mtime: AtomicU64::new(mtime),
        });

        tracing::debug!(
            id = component.id,
            name = component.descriptor.name,
            depth,
            mounting,
            "component created"
        );

        if let Some(init) = &component.descriptor.init {
            init(&component);
        }
        component
    }

    /// Get the component's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Distance from the tree root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The shared behavior template for this component kind.
    pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
        &self.descriptor
    }

    /// The parent component, if it is still alive.
    pub fn parent(&self) -> Option<Arc<Component>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Logical time of the last completed update.
    pub fn mtime(&self) -> Tick {
        self.mtime.load(Ordering::Acquire)
    }

    /// A copy of the current lifecycle flag record.
    pub fn flags(&self) -> LifecycleFlags {
        *self.flags.read()
    }

    /// Pending re-render before the next paint.
    pub fn is_dirty(&self) -> bool {
        self.flags.read().dirty
    }

    /// Part of the live tree.
    pub fn is_attached(&self) -> bool {
        self.flags.read().attached
    }

    /// Hydrating onto pre-existing host markup.
    pub fn is_mounting(&self) -> bool {
        self.flags.read().mounting
    }

    /// Terminal state.
    pub fn is_disposed(&self) -> bool {
        self.flags.read().disposed
    }

    /// Continuous per-frame update mode requested.
    pub fn is_update_each_frame(&self) -> bool {
        self.flags.read().update_each_frame
    }

    /// The opaque data payload.
    pub fn data(&self) -> Option<Payload> {
        self.data.read().clone()
    }

    /// The opaque children payload.
    pub fn children(&self) -> Option<Payload> {
        self.children.read().clone()
    }

    /// The opaque state payload.
    pub fn state(&self) -> Option<Payload> {
        self.state.read().clone()
    }

    /// Replace the state payload. Intended for descriptor hooks.
    pub fn set_state(&self, state: Payload) {
        *self.state.write() = Some(state);
    }

    /// True iff a rendered root is currently attached.
    pub fn has_root(&self) -> bool {
        self.root.read().is_some()
    }

    /// Number of durable subscriptions mirrored on this component.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Number of transient subscriptions mirrored on this component.
    pub fn transient_subscription_count(&self) -> usize {
        self.transient_subscriptions.read().len()
    }

    /// Assign new data.
    ///
    /// Delegates to the descriptor's `set_data` hook when present; the
    /// default stores the payload and invalidates.
    pub fn set_data(self: &Arc<Self>, data: Payload) {
        match &self.descriptor.set_data {
            Some(hook) => hook(self, data),
            None => {
                *self.data.write() = Some(data);
                self.invalidate();
            }
        }
    }

    /// Assign new children.
    ///
    /// Delegates to the descriptor's `set_children` hook when present; the
    /// default stores the payload and invalidates.
    pub fn set_children(self: &Arc<Self>, children: Payload) {
        match &self.descriptor.set_children {
            Some(hook) => hook(self, children),
            None => {
                *self.children.write() = Some(children);
                self.invalidate();
            }
        }
    }

    /// Join the live tree and run the descriptor's `attached` hook.
    ///
    /// Attaching a disposed component is an invariant violation.
    pub fn attach(self: &Arc<Self>) {
        {
            let mut flags = self.flags.write();
            invariant!(!flags.disposed, InvariantError::AlreadyDisposed);
            if flags.disposed {
                return;
            }
            debug_assert!(!flags.attached, "component already attached");
            flags.attached = true;
        }
        if let Some(hook) = &self.descriptor.attached {
            hook(self);
        }
    }

    /// Leave the live tree and run the descriptor's `detached` hook.
    pub fn detach(self: &Arc<Self>) {
        {
            let mut flags = self.flags.write();
            debug_assert!(flags.attached, "component not attached");
            flags.attached = false;
        }
        if let Some(hook) = &self.descriptor.detached {
            hook(self);
        }
    }

    /// Run one update if the readiness gate allows it.
    ///
    /// On execution: run the descriptor's `update` hook, stamp `mtime` with
    /// the scheduler clock, clear dirty. When the readiness predicate does
    /// not hold the call has no side effect at all.
    pub fn update(self: &Arc<Self>) {
        let ready = (self.descriptor.ready)(&*self.flags.read());
        if !ready {
            return;
        }

        tracing::trace!(id = self.id, name = self.descriptor.name, "component update");

        if let Some(hook) = &self.descriptor.update {
            hook(self);
        }

        self.mtime.store(self.scheduler.now(), Ordering::Release);
        self.flags.write().dirty = false;
    }

    /// Replace the rendered subtree root.
    ///
    /// First root: mounting mode hands it to the renderer's mount entry
    /// point against the existing host markup and clears mounting;
    /// otherwise it is rendered fresh. Subsequent roots are reconciled via
    /// the old root's `sync`. Callers invoke this from within the
    /// descriptor's `update` hook; it never decides *whether* to re-render.
    pub fn sync_vroot(&self, mut new_root: Box<dyn VRoot>) {
        let mut slot = self.root.write();
        match slot.as_mut() {
            None => {
                if self.is_mounting() {
                    new_root.mount(&self.host, self);
                    self.flags.write().mounting = false;
                } else {
                    new_root.render(&self.host, self);
                }
            }
            Some(old_root) => old_root.sync(new_root.as_mut(), self),
        }
        *slot = Some(new_root);
    }

    /// Mark the component dirty and register it for a batched next-frame
    /// update.
    ///
    /// No-op when already dirty or disposed: any number of invalidations
    /// before the next frame collapse into one update. Transient
    /// subscriptions are canceled here — they described the previous
    /// render's reads and are stale under the new data.
    pub fn invalidate(self: &Arc<Self>) {
        {
            let mut flags = self.flags.write();
            if flags.dirty || flags.disposed {
                return;
            }
            flags.dirty = true;
        }

        tracing::trace!(id = self.id, name = self.descriptor.name, "component invalidated");

        self.cancel_transient_subscriptions();
        self.scheduler.enqueue_update(self);

        if let Some(hook) = &self.descriptor.invalidated {
            hook(self);
        }
    }

    /// Request an update on every frame.
    ///
    /// Registers with the scheduler exactly once while active, no matter
    /// how many times this is called; the in-queue marker is the guard.
    pub fn start_update_each_frame(self: &Arc<Self>) {
        let register = {
            let mut flags = self.flags.write();
            if flags.disposed {
                return;
            }
            flags.update_each_frame = true;
            if flags.in_update_queue {
                false
            } else {
                flags.in_update_queue = true;
                true
            }
        };
        if register {
            self.scheduler.start_update_each_frame(self);
        }
    }

    /// Stop continuous per-frame updates.
    ///
    /// The scheduler drops the registration on its next flush and clears
    /// the in-queue marker then.
    pub fn stop_update_each_frame(&self) {
        self.flags.write().update_each_frame = false;
    }

    /// One continuous-mode tick: force the component dirty and update.
    pub(crate) fn frame_update(self: &Arc<Self>) {
        {
            let mut flags = self.flags.write();
            if flags.disposed {
                return;
            }
            flags.dirty = true;
        }
        self.update();
    }

    /// Scheduler dequeue notification for continuous mode.
    pub(crate) fn clear_in_update_queue(&self) {
        self.flags.write().in_update_queue = false;
    }

    /// Tear the component down. Irreversible, not reentrant.
    ///
    /// Sets disposed, clears attached and continuous mode, cancels both
    /// subscription sets, disposes the rendered root, then runs the
    /// descriptor's `disposed` hook. Disposing twice is an invariant
    /// violation.
    pub fn dispose(self: &Arc<Self>) {
        {
            let mut flags = self.flags.write();
            invariant!(!flags.disposed, InvariantError::AlreadyDisposed);
            if flags.disposed {
                return;
            }
            flags.disposed = true;
            flags.attached = false;
            flags.update_each_frame = false;
        }

        tracing::debug!(id = self.id, name = self.descriptor.name, "component disposed");

        self.cancel_subscriptions();

        let root = self.root.write().take();
        if let Some(mut root) = root {
            root.dispose();
        }

        if let Some(hook) = &self.descriptor.disposed {
            hook(self);
        }
    }

    /// Durable subscription to an invalidator, mirrored on this component
    /// so disposal can cancel it.
    pub fn subscribe(
        self: &Arc<Self>,
        invalidator: &Arc<Invalidator>,
    ) -> Arc<InvalidatorSubscription> {
        let sub = Arc::new(InvalidatorSubscription::component(
            Arc::downgrade(invalidator),
            false,
            Arc::downgrade(self),
        ));
        invalidator.add_subscription(sub.clone());
        self.subscriptions.write().add(sub.clone());
        sub
    }

    /// Transient subscription to an invalidator: consumed by the next
    /// invalidation wave, or canceled when this component is invalidated
    /// through another dependency first.
    pub fn transient_subscribe(
        self: &Arc<Self>,
        invalidator: &Arc<Invalidator>,
    ) -> Arc<InvalidatorSubscription> {
        let sub = Arc::new(InvalidatorSubscription::component(
            Arc::downgrade(invalidator),
            true,
            Arc::downgrade(self),
        ));
        invalidator.add_subscription(sub.clone());
        self.transient_subscriptions.write().add(sub.clone());
        sub
    }

    /// Mirror-side removal, used by subscription cancellation.
    ///
    /// Removing a subscription this component does not hold is an
    /// invariant violation.
    pub fn remove_subscription(&self, subscription: &Arc<InvalidatorSubscription>) {
        let removed = if subscription.flags().transient {
            self.transient_subscriptions.write().remove(subscription)
        } else {
            self.subscriptions.write().remove(subscription)
        };
        invariant!(removed, InvariantError::SubscriptionNotFound);
    }

    /// Cancel every subscription, durable and transient. Called on dispose.
    pub fn cancel_subscriptions(&self) {
        let durable = self.subscriptions.write().take_all();
        for sub in durable {
            sub.detach_from_invalidator();
        }
        let transient = self.transient_subscriptions.write().take_all();
        for sub in transient {
            sub.detach_from_invalidator();
        }
    }

    /// Cancel the transient subscriptions only. Called on invalidate.
    pub fn cancel_transient_subscriptions(&self) {
        let transient = self.transient_subscriptions.write().take_all();
        for sub in transient {
            sub.detach_from_invalidator();
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.descriptor.name)
            .field("depth", &self.depth)
            .field("flags", &self.flags())
            .field("mtime", &self.mtime())
            .finish()
    }
}
