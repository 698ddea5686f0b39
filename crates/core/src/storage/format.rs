use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::state::PersistedState;

/// Storage key of the serialized chat store.
pub const STORAGE_KEY: &str = "ai-chat-storage";

/// Current envelope version.
pub const CURRENT_VERSION: u32 = 0;

/// Layout:
/// ```text
/// {"state": { messages, config, groups, tasks, hasShownWelcome }, "version": 0}
/// ```
#[derive(Serialize)]
struct EnvelopeOut<'a> {
    state: &'a PersistedState,
    version: u32,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    state: serde_json::Value,
    #[serde(default)]
    version: u32,
}

/// Serialize `state` into the versioned JSON envelope.
pub fn write_envelope(state: &PersistedState) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(&EnvelopeOut {
        state,
        version: CURRENT_VERSION,
    })
    .map_err(|e| CoreError::Serialization(format!("Failed to serialize chat state: {e}")))
}

/// Parse an envelope and rebuild the state, timestamps included.
///
/// The version is checked before the state is decoded; any malformed field
/// (an unparsable timestamp, an unknown enum value) rejects the whole record.
pub fn read_envelope(data: &[u8]) -> Result<PersistedState, CoreError> {
    let envelope: EnvelopeIn = serde_json::from_slice(data)
        .map_err(|e| CoreError::Deserialization(format!("Invalid storage envelope: {e}")))?;

    if envelope.version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(envelope.version));
    }

    serde_json::from_value(envelope.state)
        .map_err(|e| CoreError::Deserialization(format!("Failed to rehydrate chat state: {e}")))
}
