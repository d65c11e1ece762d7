//! One-shot migration of the legacy single-blob profile format.

use tracing::debug;

use crate::backend::ProfileBackend;
use crate::error::StoreError;
use crate::store::AttributeStore;
use crate::value::AttributeMap;

/// Imports a legacy-format profile into the store, if one is present.
///
/// Runs once at service initialization, before the first shared-state
/// publication. The legacy blob, when it decodes, always wins over
/// whatever is already in the current store and is consumed afterwards.
/// A blob that does not decode is left in place untouched, so a later
/// launch can retry; the failure is logged, never surfaced.
///
/// Returns `true` when a migration actually happened.
pub fn migrate_if_needed<B: ProfileBackend>(
    store: &AttributeStore<B>,
) -> Result<bool, StoreError> {
    let Some(blob) = store.backend().legacy_blob()? else {
        return Ok(false);
    };
    let decoded: AttributeMap = match serde_json::from_str(&blob) {
        Ok(map) => map,
        Err(err) => {
            debug!(error = %err, "legacy profile blob did not decode; keeping it for a later attempt");
            return Ok(false);
        }
    };
    store.replace(decoded)?;
    store.backend().erase_legacy_blob()?;
    Ok(true)
}
