use std::path::Path;

/// All errors that can be returned by the attribute store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A batch contained a value outside the supported attribute value
    /// set. The whole batch is discarded; nothing is persisted.
    #[error("unsupported value for attribute '{key}': {reason}")]
    UnsupportedValue { key: String, reason: String },

    /// A backend persistence failure (filesystem, serialization).
    #[error("backend error: {0}")]
    Backend(String),
}

pub(crate) fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", path.display(), err))
}
