//! The profile service: event classification, store orchestration,
//! shared-state publication.

use profile_store::{
    map_to_json, migrate_if_needed, AttributeMap, AttributeStore, ProfileBackend, StoreError,
};
use tracing::{debug, warn};

use crate::consequence::{self, Consequence, ProfileOperation};
use crate::constants;
use crate::event::Event;
use crate::runtime::ExtensionRuntime;

/// The (event type, source) pairs this extension listens on.
pub const SUBSCRIPTIONS: &[(&str, &str)] = &[
    (constants::EVENT_TYPE_PROFILE, constants::SOURCE_REQUEST_PROFILE),
    (constants::EVENT_TYPE_PROFILE, constants::SOURCE_REQUEST_RESET),
    (
        constants::EVENT_TYPE_RULES_ENGINE,
        constants::SOURCE_RESPONSE_CONTENT,
    ),
];

/// Orchestrates the profile operations against an attribute store and
/// a host runtime.
///
/// The service is the sole caller of the store and the sole source of
/// shared-state publications. No handler is fatal: rejected batches,
/// malformed consequences, and migration failures all degrade to "no
/// state change, no notification", reported only through logging. The
/// one exception is the get path, which always answers its request,
/// even with an empty result.
pub struct ProfileService<B, R> {
    store: AttributeStore<B>,
    runtime: R,
}

impl<B: ProfileBackend, R: ExtensionRuntime> ProfileService<B, R> {
    pub fn new(store: AttributeStore<B>, runtime: R) -> Self {
        Self { store, runtime }
    }

    /// Registration-time initialization: subscribe, migrate the legacy
    /// format if present, then publish the loaded map as the initial
    /// shared state. The initial publication happens even for an empty
    /// map, so downstream consumers can tell "initialized and empty"
    /// from "not yet initialized".
    pub fn on_registered(&self) {
        for (event_type, source) in SUBSCRIPTIONS {
            self.runtime.register_listener(event_type, source);
        }
        match migrate_if_needed(&self.store) {
            Ok(true) => debug!("migrated legacy profile into the attribute store"),
            Ok(false) => {}
            Err(err) => warn!(error = %err, "legacy profile migration failed"),
        }
        match self.store.load() {
            Ok(map) => self.publish(&map),
            Err(err) => warn!(error = %err, "could not load attributes for the initial shared state"),
        }
    }

    /// Entry point for every event the host delivers to this extension.
    pub fn handle_event(&self, event: &Event) {
        match (event.event_type.as_str(), event.source.as_str()) {
            (constants::EVENT_TYPE_PROFILE, constants::SOURCE_REQUEST_PROFILE) => {
                if let Some(updates) = event.update_attributes() {
                    self.handle_update(updates);
                } else if let Some(keys) = event.get_attribute_keys() {
                    self.handle_get(event, &keys);
                } else {
                    debug!(name = %event.name, "profile request without a recognized payload");
                }
            }
            (constants::EVENT_TYPE_PROFILE, constants::SOURCE_REQUEST_RESET) => {
                if let Some(keys) = event.remove_attribute_keys() {
                    self.handle_remove(&keys);
                } else if event.is_remove_request() {
                    // A malformed key list must not escalate to a wipe.
                    debug!(name = %event.name, "remove request with a malformed key list");
                } else {
                    self.handle_reset();
                }
            }
            (constants::EVENT_TYPE_RULES_ENGINE, constants::SOURCE_RESPONSE_CONTENT) => {
                if let Some(raw) = event.triggered_consequence() {
                    self.handle_consequence(raw);
                }
            }
            (event_type, source) => {
                debug!(%event_type, %source, "ignoring event outside our subscriptions");
            }
        }
    }

    fn handle_update(&self, updates: &serde_json::Map<String, serde_json::Value>) {
        match self.store.merge(updates) {
            Ok(Some(map)) => self.publish(&map),
            Ok(None) => {}
            Err(err @ StoreError::UnsupportedValue { .. }) => {
                warn!(error = %err, "update batch rejected; nothing was persisted");
            }
            Err(err) => warn!(error = %err, "update failed against the backend"),
        }
    }

    fn handle_get(&self, request: &Event, keys: &[String]) {
        // Store failures on the get path yield an empty result, never
        // an error; the request always gets exactly one response.
        let selected = match self.store.select(keys) {
            Ok(selected) => selected,
            Err(err) => {
                warn!(error = %err, "selection failed; answering with an empty result");
                AttributeMap::new()
            }
        };
        let data = serde_json::json!({ constants::GET_DATA_KEY: map_to_json(&selected) });
        self.runtime.dispatch(Event::response_to(
            request,
            constants::SOURCE_RESPONSE_PROFILE,
            Some(data),
        ));
    }

    fn handle_remove(&self, keys: &[String]) {
        match self.store.delete(keys) {
            Ok(Some(map)) => self.publish(&map),
            Ok(None) => debug!("remove request matched no attributes"),
            Err(err) => warn!(error = %err, "remove failed against the backend"),
        }
    }

    fn handle_reset(&self) {
        match self.store.clear() {
            Ok(()) => self.publish(&AttributeMap::new()),
            Err(err) => warn!(error = %err, "reset failed against the backend"),
        }
    }

    fn handle_consequence(&self, raw: &serde_json::Value) {
        let parsed: Consequence = match serde_json::from_value(raw.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "dropping consequence that does not deserialize");
                return;
            }
        };
        match consequence::interpret(&parsed) {
            Some(ProfileOperation::Write { attributes }) => self.handle_update(&attributes),
            Some(ProfileOperation::Delete { keys }) => self.handle_remove(&keys),
            None => {}
        }
    }

    fn publish(&self, map: &AttributeMap) {
        let data = serde_json::json!({ constants::SHARED_STATE_DATA_KEY: map_to_json(map) });
        self.runtime.create_shared_state(data);
    }
}
