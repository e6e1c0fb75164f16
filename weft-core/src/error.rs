//! Invariant Violations
//!
//! Every failure in this core is a programmer error: there is no I/O, no
//! external failure surface, and nothing transient to retry. The categories
//! are small and fixed:
//!
//! - canceling a subscription that was already canceled
//! - removing a subscription from a set that does not contain it
//! - disposing a component that was already disposed
//!
//! Debug builds fail fast and loud: the `invariant!` macro panics with a
//! descriptive message. Release builds elide the checks entirely, and the
//! behavior on a violated invariant is undefined — callers must guarantee
//! the invariants hold.

use thiserror::Error;

/// A violated invariant in the invalidation/lifecycle core.
///
/// These are never returned from public operations; they exist to give the
/// debug-build panics a stable, descriptive message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
    /// A subscription was canceled (or consumed) twice.
    #[error("subscription already canceled")]
    SubscriptionAlreadyCanceled,

    /// A subscription was removed from a set that does not contain it.
    #[error("subscription not present in the target set")]
    SubscriptionNotFound,

    /// A component was disposed (or attached) after disposal.
    #[error("component already disposed")]
    AlreadyDisposed,
}

/// Check an invariant in debug builds.
///
/// Panics with the error's display message when the condition is false.
/// Compiles to nothing observable in release builds; the condition must be
/// side-effect free.
macro_rules! invariant {
    ($cond:expr, $err:expr) => {
        if cfg!(debug_assertions) && !$cond {
            panic!("invariant violation: {}", $err);
        }
    };
}

pub(crate) use invariant;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        assert_eq!(
            InvariantError::SubscriptionAlreadyCanceled.to_string(),
            "subscription already canceled"
        );
        assert_eq!(
            InvariantError::SubscriptionNotFound.to_string(),
            "subscription not present in the target set"
        );
        assert_eq!(
            InvariantError::AlreadyDisposed.to_string(),
            "component already disposed"
        );
    }

    #[test]
    fn invariant_passes_when_condition_holds() {
        invariant!(true, InvariantError::AlreadyDisposed);
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn invariant_panics_in_debug_builds() {
        invariant!(false, InvariantError::AlreadyDisposed);
    }
}
