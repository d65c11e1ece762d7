//! The host event model and payload accessors.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants;

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// A single event on the host bus.
///
/// Identifiers are process-local; a response carries the id of the
/// request it answers in `response_id` so the host can correlate it.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: u64,
    pub name: String,
    pub event_type: String,
    pub source: String,
    pub data: Option<serde_json::Value>,
    pub response_id: Option<u64>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        event_type: impl Into<String>,
        source: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            event_type: event_type.into(),
            source: source.into(),
            data,
            response_id: None,
        }
    }

    /// Builds the response to `request`, correlated by id. The response
    /// keeps the request's name and event type.
    pub fn response_to(
        request: &Event,
        source: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            name: request.name.clone(),
            event_type: request.event_type.clone(),
            source: source.into(),
            data,
            response_id: Some(request.id),
        }
    }

    fn data_field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_ref()?.get(key)
    }

    /// The attribute object of an update request, if this is one.
    pub fn update_attributes(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.data_field(constants::UPDATE_DATA_KEY)?.as_object()
    }

    /// The requested attribute names of a get request, if this is one.
    /// Non-string entries are ignored.
    pub fn get_attribute_keys(&self) -> Option<Vec<String>> {
        let keys = self.data_field(constants::GET_DATA_KEY)?.as_array()?;
        Some(
            keys.iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// True when the event carries a remove payload at all, well formed
    /// or not. Distinguishes a bad remove request from a full reset.
    pub fn is_remove_request(&self) -> bool {
        self.data_field(constants::REMOVE_DATA_KEY).is_some()
    }

    /// The attribute names of a remove request, if this is one.
    pub fn remove_attribute_keys(&self) -> Option<Vec<String>> {
        let keys = self.data_field(constants::REMOVE_DATA_KEY)?.as_array()?;
        Some(
            keys.iter()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// The raw triggered consequence of a rules-engine event.
    pub fn triggered_consequence(&self) -> Option<&serde_json::Value> {
        self.data_field(constants::CONSEQUENCE_DATA_KEY)
    }
}
