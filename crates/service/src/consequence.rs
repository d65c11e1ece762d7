//! Interpretation of rules-engine consequences.
//!
//! The rules engine emits many consequence shapes; only `"csp"` ones
//! concern the profile. Everything else, and every malformed shape, is
//! dropped without an error: a noisy rules configuration must not crash
//! or corrupt profile state.

use serde::Deserialize;
use tracing::debug;

/// Consequence type handled by this extension.
pub const CONSEQUENCE_TYPE_CSP: &str = "csp";
/// Detail operation that writes a single attribute.
pub const OPERATION_WRITE: &str = "write";
/// Detail operation that deletes a single attribute.
pub const OPERATION_DELETE: &str = "delete";

/// A triggered consequence as emitted by the rules engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Consequence {
    #[serde(rename = "type", default)]
    pub consequence_type: Option<String>,
    #[serde(default)]
    pub detail: ConsequenceDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsequenceDetail {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
}

/// A profile mutation derived from a client call or a consequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileOperation {
    /// Set (or, for empty-string values, remove) a batch of attributes.
    Write {
        attributes: serde_json::Map<String, serde_json::Value>,
    },
    /// Remove a batch of attributes by name.
    Delete { keys: Vec<String> },
}

/// Turns a consequence into a typed operation, or `None` when it is not
/// ours or not well formed.
///
/// A `"write"` without a value writes the empty string, which under the
/// store's contract deletes the attribute: deletion-by-write is legal.
pub fn interpret(consequence: &Consequence) -> Option<ProfileOperation> {
    if consequence.consequence_type.as_deref() != Some(CONSEQUENCE_TYPE_CSP) {
        // Some other subsystem's consequence; not our concern.
        return None;
    }
    let detail = &consequence.detail;
    let key = match detail.key.as_deref() {
        Some(key) if !key.is_empty() => key,
        _ => {
            debug!(operation = ?detail.operation, "dropping csp consequence without a key");
            return None;
        }
    };
    match detail.operation.as_deref() {
        Some(OPERATION_WRITE) => {
            let value = detail.value.clone().unwrap_or_default();
            let mut attributes = serde_json::Map::new();
            attributes.insert(key.to_string(), serde_json::Value::String(value));
            Some(ProfileOperation::Write { attributes })
        }
        Some(OPERATION_DELETE) => Some(ProfileOperation::Delete {
            keys: vec![key.to_string()],
        }),
        other => {
            debug!(operation = ?other, "dropping csp consequence with unrecognized operation");
            None
        }
    }
}
