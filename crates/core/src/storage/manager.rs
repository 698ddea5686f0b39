use crate::errors::CoreError;
use crate::models::state::PersistedState;

use super::backend::StorageBackend;
use super::format::{self, STORAGE_KEY};

/// High-level storage operations: save/load the chat state to/from bytes or
/// a [`StorageBackend`].
pub struct StorageManager;

impl StorageManager {
    /// Flow: PersistedState → JSON envelope bytes
    pub fn save_to_bytes(state: &PersistedState) -> Result<Vec<u8>, CoreError> {
        format::write_envelope(state)
    }

    /// Flow: JSON envelope bytes → version check → PersistedState
    pub fn load_from_bytes(data: &[u8]) -> Result<PersistedState, CoreError> {
        format::read_envelope(data)
    }

    /// Write the state under [`STORAGE_KEY`].
    pub fn save(backend: &dyn StorageBackend, state: &PersistedState) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(state)?;
        backend.set(STORAGE_KEY, &bytes)
    }

    /// Read the state stored under [`STORAGE_KEY`], if any.
    pub fn load(backend: &dyn StorageBackend) -> Result<Option<PersistedState>, CoreError> {
        match backend.get(STORAGE_KEY)? {
            Some(bytes) => Self::load_from_bytes(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Forget the stored state.
    pub fn clear(backend: &dyn StorageBackend) -> Result<(), CoreError> {
        backend.remove(STORAGE_KEY)
    }
}
