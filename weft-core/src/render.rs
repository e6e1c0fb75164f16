//! Renderer Interface
//!
//! The virtual-tree renderer is an external collaborator. This core hands a
//! rendered subtree root across the [`VRoot`] trait and never inspects its
//! internals: reconciliation, element creation, and namespace selection all
//! live on the other side of this boundary.
//!
//! A component owns at most one root at a time. The root is handed to the
//! renderer in one of three ways:
//!
//! - `mount`: hydrate onto pre-existing host markup (mounting path)
//! - `render`: create fresh output under the host element
//! - `sync`: reconcile the previous root against a newly rendered one
//!
//! `dispose` releases whatever the renderer holds for the subtree. It is
//! called exactly once, when the owning component is disposed.

use std::any::Any;
use std::sync::Arc;

use crate::component::Component;

/// Opaque host-element handle.
///
/// Acquisition is outside this core; the handle is supplied at component
/// construction time and passed through to the renderer untouched.
pub type Host = Arc<dyn Any + Send + Sync>;

/// A rendered virtual-subtree root.
///
/// Implementations must not call back into the owning component's
/// [`sync_vroot`](Component::sync_vroot) or root accessors from within these
/// methods: the component holds its root slot locked for the duration of the
/// call.
pub trait VRoot: Send + Sync {
    /// Hydrate this root onto pre-existing markup under `host`.
    fn mount(&mut self, host: &Host, owner: &Component);

    /// Render this root fresh under `host`.
    fn render(&mut self, host: &Host, owner: &Component);

    /// Reconcile `self` (the previous root) against `next` (the new one).
    fn sync(&mut self, next: &mut dyn VRoot, owner: &Component);

    /// Release everything held for this subtree.
    fn dispose(&mut self);
}
