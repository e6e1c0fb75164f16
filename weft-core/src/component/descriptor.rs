//! Component Descriptors
//!
//! A descriptor is the shared behavior template for one component kind: a
//! flyweight holding optional hook functions that every instance of the
//! kind dispatches through. There is no component subclassing; a "kind" is
//! exactly one descriptor value, built once and shared by `Arc`.
//!
//! Hooks are all optional. A descriptor with no hooks at all is a valid
//! (if inert) component kind.

use std::any::Any;
use std::sync::Arc;

use super::flags::{default_ready_to_update, ReadyPredicate};
use super::Component;

/// Opaque hook-owned payload: component data, children, or state.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A lifecycle hook: receives the component instance.
pub type Hook = Box<dyn Fn(&Arc<Component>) + Send + Sync>;

/// An assignment hook: receives the component instance and the new payload.
pub type PayloadHook = Box<dyn Fn(&Arc<Component>, Payload) + Send + Sync>;

/// Shared behavior template for a component kind.
///
/// # Example
///
/// ```rust,ignore
/// let descriptor = Arc::new(
///     ComponentDescriptor::new("Counter")
///         .with_init(|c| c.set_state(Arc::new(0u32)))
///         .with_update(|c| {
///             // render and hand the new root over
///             c.sync_vroot(render_counter(c));
///         }),
/// );
/// ```
pub struct ComponentDescriptor {
    /// Display/debug name of the component kind.
    pub(crate) name: &'static str,

    /// Element-namespace selector, passed through to the renderer untouched.
    pub(crate) namespace: Option<&'static str>,

    /// The "may I update" gate evaluated by `Component::update`.
    pub(crate) ready: ReadyPredicate,

    /// Runs synchronously during construction, before the factory returns.
    pub(crate) init: Option<Hook>,

    /// Assigns new data; absent means "store and invalidate".
    pub(crate) set_data: Option<PayloadHook>,

    /// Assigns new children; absent means "store and invalidate".
    pub(crate) set_children: Option<PayloadHook>,

    /// Re-renders the component. Called only through `Component::update`.
    pub(crate) update: Option<Hook>,

    /// Runs after the component is marked dirty and queued.
    pub(crate) invalidated: Option<Hook>,

    /// Runs when the component joins the live tree.
    pub(crate) attached: Option<Hook>,

    /// Runs when the component leaves the live tree.
    pub(crate) detached: Option<Hook>,

    /// Runs at the end of disposal.
    pub(crate) disposed: Option<Hook>,
}

impl ComponentDescriptor {
    /// Create a descriptor with the given debug name and no hooks.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            namespace: None,
            ready: default_ready_to_update,
            init: None,
            set_data: None,
            set_children: None,
            update: None,
            invalidated: None,
            attached: None,
            detached: None,
            disposed: None,
        }
    }

    /// Display/debug name of the component kind.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Element-namespace selector, if any.
    pub fn namespace(&self) -> Option<&'static str> {
        self.namespace
    }

    /// Set the element namespace passed through to the renderer.
    pub fn with_namespace(mut self, namespace: &'static str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Replace the readiness predicate for this component kind.
    pub fn with_ready(mut self, ready: ReadyPredicate) -> Self {
        self.ready = ready;
        self
    }

    /// Hook run synchronously during construction.
    pub fn with_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.init = Some(Box::new(hook));
        self
    }

    /// Hook run when new data is assigned.
    pub fn with_set_data<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>, Payload) + Send + Sync + 'static,
    {
        self.set_data = Some(Box::new(hook));
        self
    }

    /// Hook run when new children are assigned.
    pub fn with_set_children<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>, Payload) + Send + Sync + 'static,
    {
        self.set_children = Some(Box::new(hook));
        self
    }

    /// Hook that re-renders the component.
    pub fn with_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.update = Some(Box::new(hook));
        self
    }

    /// Hook run after the component is marked dirty and queued.
    pub fn with_invalidated<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.invalidated = Some(Box::new(hook));
        self
    }

    /// Hook run when the component joins the live tree.
    pub fn with_attached<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.attached = Some(Box::new(hook));
        self
    }

    /// Hook run when the component leaves the live tree.
    pub fn with_detached<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.detached = Some(Box::new(hook));
        self
    }

    /// Hook run at the end of disposal.
    pub fn with_disposed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arc<Component>) + Send + Sync + 'static,
    {
        self.disposed = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_starts_with_no_hooks() {
        let descriptor = ComponentDescriptor::new("Plain");
        assert_eq!(descriptor.name(), "Plain");
        assert_eq!(descriptor.namespace(), None);
        assert!(descriptor.init.is_none());
        assert!(descriptor.update.is_none());
        assert!(descriptor.disposed.is_none());
    }

    #[test]
    fn builder_installs_hooks() {
        let descriptor = ComponentDescriptor::new("Rich")
            .with_namespace("svg")
            .with_init(|_| {})
            .with_update(|_| {})
            .with_disposed(|_| {});

        assert_eq!(descriptor.namespace(), Some("svg"));
        assert!(descriptor.init.is_some());
        assert!(descriptor.update.is_some());
        assert!(descriptor.disposed.is_some());
        assert!(descriptor.set_data.is_none());
    }
}
