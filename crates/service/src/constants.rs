//! Wire constants shared with the host runtime and the rules engine.

/// Event type for profile requests and responses.
pub const EVENT_TYPE_PROFILE: &str = "userprofile";
/// Event type the rules engine emits consequences under.
pub const EVENT_TYPE_RULES_ENGINE: &str = "rulesengine";

/// Source of update and get requests.
pub const SOURCE_REQUEST_PROFILE: &str = "request-profile";
/// Source of remove and full-reset requests.
pub const SOURCE_REQUEST_RESET: &str = "request-reset";
/// Source of get responses dispatched back to the requester.
pub const SOURCE_RESPONSE_PROFILE: &str = "response-profile";
/// Source of rules-engine consequence events.
pub const SOURCE_RESPONSE_CONTENT: &str = "response-content";

/// Payload key of an update request: a JSON object of attributes.
pub const UPDATE_DATA_KEY: &str = "userprofileupdatekey";
/// Payload key of a get request and its response: an array of names,
/// respectively the selected attribute object.
pub const GET_DATA_KEY: &str = "userprofilegetattributes";
/// Payload key of a remove request: an array of names.
pub const REMOVE_DATA_KEY: &str = "userprofileremovekeys";
/// Payload key of a triggered rules consequence.
pub const CONSEQUENCE_DATA_KEY: &str = "triggeredconsequence";

/// Namespace key the full map is published under in the shared state.
pub const SHARED_STATE_DATA_KEY: &str = "userprofiledata";
/// Name this extension's shared state is registered as.
pub const SHARED_STATE_NAME: &str = "profile.attributes";
