use thiserror::Error;

/// Unified error type for the entire finsense-widget-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / Persistence ───────────────────────────────────────
    #[error("Unsupported persisted state version: {0}")]
    UnsupportedVersion(u32),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Network / Data ──────────────────────────────────────────────
    #[error("Failed to fetch {endpoint}: {status}")]
    Fetch { endpoint: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Assistant error ({provider}): {message}")]
    Api { provider: String, message: String },

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; strip the query string so
        // credentials passed as parameters never reach logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
