//! A message-recording runtime double for tests.
//!
//! Records every registration, dispatch, and shared-state publication,
//! and can route request events into a handler (normally the service
//! under test) so client calls round-trip without a real bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::constants;
use crate::event::Event;
use crate::runtime::{ExtensionRuntime, Responder};

type EventHandler = Box<dyn Fn(&Event) + Send>;

/// Test double for the host runtime. Clones share the recorded state.
#[derive(Clone, Default)]
pub struct MockRuntime {
    state: Arc<Mutex<MockState>>,
    handler: Arc<Mutex<Option<EventHandler>>>,
}

#[derive(Default)]
struct MockState {
    listeners: Vec<(String, String)>,
    dispatched: Vec<Event>,
    shared_states: Vec<serde_json::Value>,
    responders: HashMap<u64, Responder>,
}

impl MockRuntime {
    /// Routes every subsequently dispatched request event into
    /// `handler`, the way the host would deliver it to a listener.
    pub fn set_event_handler(&self, handler: impl Fn(&Event) + Send + 'static) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(handler));
    }

    pub fn listeners(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .clone()
    }

    pub fn dispatched_events(&self) -> Vec<Event> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dispatched
            .clone()
    }

    pub fn shared_states(&self) -> Vec<serde_json::Value> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shared_states
            .clone()
    }

    pub fn clear_shared_states(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shared_states
            .clear();
    }

    /// Fails every pending responder with `None`, the way the host
    /// reports a response it could not deliver in time.
    pub fn expire_pending_responses(&self) {
        let responders: Vec<Responder> = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.responders.drain().map(|(_, r)| r).collect()
        };
        for responder in responders {
            responder(None);
        }
    }

    fn route_to_handler(&self, event: &Event) {
        let handler = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handler.as_ref() {
            handler(event);
        }
    }
}

impl ExtensionRuntime for MockRuntime {
    fn register_listener(&self, event_type: &str, source: &str) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .push((event_type.to_string(), source.to_string()));
    }

    fn dispatch(&self, event: Event) {
        let responder = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let responder = event
                .response_id
                .and_then(|id| state.responders.remove(&id));
            state.dispatched.push(event.clone());
            responder
        };
        if let Some(responder) = responder {
            // A response: hand it to whoever asked for it.
            responder(Some(event));
        } else {
            self.route_to_handler(&event);
        }
    }

    fn dispatch_with_responder(&self, event: Event, responder: Responder) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.responders.insert(event.id, responder);
            state.dispatched.push(event.clone());
        }
        self.route_to_handler(&event);
    }

    fn create_shared_state(&self, data: serde_json::Value) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shared_states
            .push(data);
    }

    fn get_shared_state(&self, name: &str) -> Option<serde_json::Value> {
        if name != constants::SHARED_STATE_NAME {
            return None;
        }
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shared_states
            .last()
            .cloned()
    }
}
