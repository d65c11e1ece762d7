//! Event-driven acceptance tests for the profile service, run against
//! the mock runtime and the in-memory backend.

use profile_service::constants;
use profile_service::mock::MockRuntime;
use profile_service::{Event, ProfileService};
use profile_store::{AttributeMap, AttributeStore, AttributeValue, MemoryBackend};

fn text(s: &str) -> AttributeValue {
    AttributeValue::Text(s.to_string())
}

fn seeded(entries: &[(&str, &str)]) -> MemoryBackend {
    let backend = MemoryBackend::default();
    let map: AttributeMap = entries
        .iter()
        .map(|(k, v)| (k.to_string(), text(v)))
        .collect();
    backend.set_attributes(map);
    backend
}

fn registered(
    backend: MemoryBackend,
) -> (MockRuntime, ProfileService<MemoryBackend, MockRuntime>) {
    let runtime = MockRuntime::default();
    let service = ProfileService::new(AttributeStore::new(backend), runtime.clone());
    service.on_registered();
    (runtime, service)
}

fn profile_data(shared_state: &serde_json::Value) -> &serde_json::Map<String, serde_json::Value> {
    shared_state[constants::SHARED_STATE_DATA_KEY]
        .as_object()
        .expect("shared state carries the profile data object")
}

fn update_event(attributes: serde_json::Value) -> Event {
    Event::new(
        "UserProfileUpdate",
        constants::EVENT_TYPE_PROFILE,
        constants::SOURCE_REQUEST_PROFILE,
        Some(serde_json::json!({ constants::UPDATE_DATA_KEY: attributes })),
    )
}

fn get_event(keys: serde_json::Value) -> Event {
    Event::new(
        "getUserAttributes",
        constants::EVENT_TYPE_PROFILE,
        constants::SOURCE_REQUEST_PROFILE,
        Some(serde_json::json!({ constants::GET_DATA_KEY: keys })),
    )
}

fn remove_event(keys: serde_json::Value) -> Event {
    Event::new(
        "RemoveUserProfiles",
        constants::EVENT_TYPE_PROFILE,
        constants::SOURCE_REQUEST_RESET,
        Some(serde_json::json!({ constants::REMOVE_DATA_KEY: keys })),
    )
}

fn consequence_event(consequence: serde_json::Value) -> Event {
    Event::new(
        "consequence event",
        constants::EVENT_TYPE_RULES_ENGINE,
        constants::SOURCE_RESPONSE_CONTENT,
        Some(serde_json::json!({ constants::CONSEQUENCE_DATA_KEY: consequence })),
    )
}

#[test]
fn registration_publishes_an_empty_initial_state() {
    let (runtime, _service) = registered(MemoryBackend::default());

    let listeners = runtime.listeners();
    assert_eq!(listeners.len(), 3);
    assert!(listeners.contains(&(
        constants::EVENT_TYPE_PROFILE.to_string(),
        constants::SOURCE_REQUEST_PROFILE.to_string()
    )));
    assert!(listeners.contains(&(
        constants::EVENT_TYPE_PROFILE.to_string(),
        constants::SOURCE_REQUEST_RESET.to_string()
    )));
    assert!(listeners.contains(&(
        constants::EVENT_TYPE_RULES_ENGINE.to_string(),
        constants::SOURCE_RESPONSE_CONTENT.to_string()
    )));

    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert!(profile_data(&states[0]).is_empty());
}

#[test]
fn registration_publishes_stored_attributes() {
    let (runtime, _service) = registered(seeded(&[("key1", "value1"), ("key2", "value2")]));

    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY],
        serde_json::json!({"key1": "value1", "key2": "value2"})
    );
}

#[test]
fn registration_migrates_the_legacy_profile_first() {
    let backend = MemoryBackend::default();
    backend.set_legacy_blob(r#"{"a":"aaa","b":123,"c":[1,2],"d":{"a1":"xx","a2":"yy"}}"#);
    let (runtime, _service) = registered(backend.clone());

    assert!(backend.stored_legacy_blob().is_none());
    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY],
        serde_json::json!({"a":"aaa","b":123,"c":[1,2],"d":{"a1":"xx","a2":"yy"}})
    );
}

#[test]
fn registration_with_an_undecodable_legacy_blob_publishes_empty() {
    let backend = MemoryBackend::default();
    backend.set_legacy_blob(r#"{ "d" }"#);
    let (runtime, _service) = registered(backend.clone());

    // Blob stays for a retry on the next launch; the state is empty.
    assert!(backend.stored_legacy_blob().is_some());
    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert!(profile_data(&states[0]).is_empty());
}

#[test]
fn consequence_write_adds_an_attribute() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&consequence_event(serde_json::json!({
        "type": "csp",
        "detail": {"key": "key3", "value": "value3", "operation": "write"}
    })));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 3);
    assert_eq!(stored["key3"], text("value3"));

    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(profile_data(&states[0]).len(), 3);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY]["key3"],
        serde_json::json!("value3")
    );
}

#[test]
fn consequence_write_with_an_empty_value_deletes_the_attribute() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&consequence_event(serde_json::json!({
        "type": "csp",
        "detail": {"key": "key1", "value": "", "operation": "write"}
    })));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored["key2"], text("value2"));

    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY],
        serde_json::json!({"key2": "value2"})
    );
}

#[test]
fn consequence_delete_removes_the_attribute() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&consequence_event(serde_json::json!({
        "type": "csp",
        "detail": {"key": "key1", "operation": "delete"}
    })));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 1);
    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY],
        serde_json::json!({"key2": "value2"})
    );
}

#[test]
fn malformed_consequences_publish_nothing_and_change_nothing() {
    let backend = seeded(&[("key1", "value1")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    let malformed = [
        serde_json::json!({"detail": {"key": "key3", "value": "value3", "operation": "write"}}),
        serde_json::json!({"type": "csp", "detail": {"value": "value3", "operation": "write"}}),
        serde_json::json!({"type": "csp", "detail": {"operation": "delete"}}),
        serde_json::json!({"type": "csp", "detail": {"key": "key3", "operation": "add"}}),
        serde_json::json!({"type": "csp", "detail": {"key": "key3"}}),
        // not even an object
        serde_json::json!(5),
    ];
    for consequence in malformed {
        service.handle_event(&consequence_event(consequence));
    }

    assert!(runtime.shared_states().is_empty());
    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored["key1"], text("value1"));
}

#[test]
fn update_event_merges_and_publishes() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&update_event(serde_json::json!({
        "key1": "valuex",
        "key2": ""
    })));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored["key1"], text("valuex"));

    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY],
        serde_json::json!({"key1": "valuex"})
    );
}

#[test]
fn update_event_preserves_other_value_types() {
    let backend = MemoryBackend::default();
    let mut map = AttributeMap::new();
    map.insert("k_string".to_string(), text("value1"));
    map.insert("k_int".to_string(), AttributeValue::Int(2));
    map.insert("k_bool".to_string(), AttributeValue::Bool(true));
    map.insert("k_double".to_string(), AttributeValue::Float(2.1));
    backend.set_attributes(map);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&update_event(serde_json::json!({"k_int": 3})));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 4);
    assert_eq!(stored["k_string"], text("value1"));
    assert_eq!(stored["k_int"], AttributeValue::Int(3));
    assert_eq!(stored["k_bool"], AttributeValue::Bool(true));
    assert_eq!(stored["k_double"], AttributeValue::Float(2.1));
    assert_eq!(runtime.shared_states().len(), 1);
}

#[test]
fn update_with_an_unsupported_value_changes_nothing() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&update_event(serde_json::json!({
        "key1": "valuex",
        "key2": null
    })));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored["key1"], text("value1"));
    assert!(runtime.shared_states().is_empty());
}

#[test]
fn update_with_an_empty_batch_publishes_nothing() {
    let backend = seeded(&[("key1", "value1")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&update_event(serde_json::json!({})));

    assert!(runtime.shared_states().is_empty());
    assert_eq!(backend.stored_attributes().expect("persisted").len(), 1);
}

#[test]
fn get_event_dispatches_exactly_one_correlated_response() {
    let (runtime, service) = registered(seeded(&[("key1", "value1"), ("key2", "value2")]));
    runtime.clear_shared_states();

    let request = get_event(serde_json::json!(["key1", "key2", "key3"]));
    service.handle_event(&request);

    assert!(runtime.shared_states().is_empty());
    let dispatched = runtime.dispatched_events();
    assert_eq!(dispatched.len(), 1);
    let response = &dispatched[0];
    assert_eq!(response.name, "getUserAttributes");
    assert_eq!(response.event_type, constants::EVENT_TYPE_PROFILE);
    assert_eq!(response.source, constants::SOURCE_RESPONSE_PROFILE);
    assert_eq!(response.response_id, Some(request.id));
    assert_eq!(
        response.data.as_ref().expect("payload")[constants::GET_DATA_KEY],
        serde_json::json!({"key1": "value1", "key2": "value2"})
    );
}

#[test]
fn get_event_with_an_empty_key_list_returns_the_whole_map() {
    let (runtime, service) = registered(seeded(&[("key1", "value1"), ("key2", "value2")]));
    runtime.clear_shared_states();

    service.handle_event(&get_event(serde_json::json!([])));

    let dispatched = runtime.dispatched_events();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(
        dispatched[0].data.as_ref().expect("payload")[constants::GET_DATA_KEY],
        serde_json::json!({"key1": "value1", "key2": "value2"})
    );
}

#[test]
fn remove_event_publishes_on_a_real_change() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&remove_event(serde_json::json!(["key2", "key3"])));

    let stored = backend.stored_attributes().expect("persisted");
    assert_eq!(stored.len(), 1);
    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert_eq!(
        states[0][constants::SHARED_STATE_DATA_KEY],
        serde_json::json!({"key1": "value1"})
    );
}

#[test]
fn remove_event_for_absent_keys_publishes_nothing() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&remove_event(serde_json::json!(["key3"])));

    assert_eq!(backend.stored_attributes().expect("persisted").len(), 2);
    assert!(runtime.shared_states().is_empty());
}

#[test]
fn remove_event_with_a_malformed_key_list_does_not_reset() {
    let backend = seeded(&[("key1", "value1")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&remove_event(serde_json::json!("not-a-list")));

    assert_eq!(backend.stored_attributes().expect("persisted").len(), 1);
    assert!(runtime.shared_states().is_empty());
}

#[test]
fn reset_event_clears_and_publishes_an_empty_state() {
    let backend = seeded(&[("key1", "value1"), ("key2", "value2")]);
    let (runtime, service) = registered(backend.clone());
    runtime.clear_shared_states();

    service.handle_event(&Event::new(
        "ResetUserAttributes",
        constants::EVENT_TYPE_PROFILE,
        constants::SOURCE_REQUEST_RESET,
        None,
    ));

    assert!(backend.stored_attributes().is_none());
    let states = runtime.shared_states();
    assert_eq!(states.len(), 1);
    assert!(profile_data(&states[0]).is_empty());
}
