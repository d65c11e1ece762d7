//! The injected host-runtime capability set.

use crate::event::Event;

/// Callback invoked with the response to a request event, or `None`
/// when the host gave up on delivery (its own timeout, not ours).
pub type Responder = Box<dyn FnOnce(Option<Event>) + Send>;

/// What the extension needs from the surrounding event runtime.
///
/// The service depends on this trait, never on a concrete host, so a
/// message-recording double can stand in for the whole bus in tests
/// (see [`crate::mock::MockRuntime`]).
pub trait ExtensionRuntime {
    /// Announces interest in events of the given type and source.
    fn register_listener(&self, event_type: &str, source: &str);

    /// Fire-and-forget dispatch onto the bus. Delivery ordering to
    /// other listeners is the host's business.
    fn dispatch(&self, event: Event);

    /// Dispatches a request whose correlated response should be handed
    /// to `responder`.
    fn dispatch_with_responder(&self, event: Event, responder: Responder);

    /// Publishes a versioned shared-state snapshot for this extension.
    fn create_shared_state(&self, data: serde_json::Value);

    /// Reads another extension's (or our own) latest shared state.
    fn get_shared_state(&self, name: &str) -> Option<serde_json::Value>;
}
