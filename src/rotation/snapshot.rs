use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Secret, SessionError};

/// The three live secret generations.
///
/// `present` signs, `present` and `past` verify, `future` is pre-generated
/// and takes over at the next rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub future: Arc<Secret>,
    pub present: Arc<Secret>,
    pub past: Arc<Secret>,
}

impl Snapshot {
    /// Exports the snapshot, entropy included, as JSON bytes.
    ///
    /// The output is key material; store it like any other secret.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SessionError> {
        serde_json::to_vec(self).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    /// Restores a snapshot exported with [`Snapshot::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Serialization` on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SessionError> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    /// True if `id` belongs to any live generation.
    pub fn contains_id(&self, id: &str) -> bool {
        self.future.id() == id || self.present.id() == id || self.past.id() == id
    }
}
