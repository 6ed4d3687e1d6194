//! Host observability hooks.
//!
//! Deployments can watch session lifecycle and command traffic, and feed
//! the server a link-layer health signal, by implementing [`ServerHooks`]
//! and handing it to the server builder. Every method has a no-op
//! default, so implementors override only what they need.

/// Callbacks invoked by the server at well-defined points.
///
/// All methods are called from worker tasks and must not block.
pub trait ServerHooks: Send + Sync {
    /// A client was assigned to a worker slot.
    fn connected(&self) {}

    /// A session ended and its slot was released.
    fn disconnected(&self) {}

    /// A command verb is about to be handled.
    fn cmd_begin(&self, _verb: &str) {}

    /// A command verb finished handling.
    fn cmd_end(&self, _verb: &str) {}

    /// Link-layer health probe. Returning `false` makes idle sessions
    /// abort instead of waiting out their inactivity budget.
    fn link_up(&self) -> bool {
        true
    }
}

/// The default [`ServerHooks`] implementation: does nothing and reports
/// the link as up.
#[derive(Debug, Default)]
pub struct NopHooks;

impl ServerHooks for NopHooks {}
