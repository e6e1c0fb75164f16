//! Lifecycle Flags
//!
//! A component's lifecycle is a set of independent booleans, not a single
//! mutually-exclusive state. `disposed` is terminal and excludes every
//! other meaningful transition; the rest combine freely.
//!
//! The "may I update" decision is not owned by this module: the composing
//! flags are defined by the surrounding framework, so the component stores
//! a [`ReadyPredicate`] supplied through its descriptor and treats it as an
//! opaque gate. [`default_ready_to_update`] is the stock predicate.

/// Independent lifecycle flags of a live component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleFlags {
    /// Part of the live tree.
    pub attached: bool,

    /// Hydrating onto pre-existing host markup; cleared by the first
    /// rendered root.
    pub mounting: bool,

    /// Pending re-render before the next paint.
    pub dirty: bool,

    /// Terminal. Never cleared.
    pub disposed: bool,

    /// Continuous per-frame update mode requested.
    pub update_each_frame: bool,

    /// Already registered in the scheduler's recurring set; prevents
    /// duplicate registration. Cleared by the scheduler on dequeue.
    pub in_update_queue: bool,
}

/// The opaque "may I update" gate evaluated by [`Component::update`].
///
/// [`Component::update`]: crate::component::Component::update
pub type ReadyPredicate = fn(&LifecycleFlags) -> bool;

/// The stock readiness predicate: attached, dirty, and not disposed.
pub fn default_ready_to_update(flags: &LifecycleFlags) -> bool {
    flags.attached && flags.dirty && !flags.disposed
}
