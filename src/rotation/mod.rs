//! Signing-secret generation and the future/present/past rotation window.
//!
//! A [`Rotation`] keeps three secret generations. At every rotation the
//! future secret becomes present, the present one becomes past and a fresh
//! future secret is generated. The callback receives each new
//! `(present, past)` pair, usually through [`rotation_callback`] wired to a
//! [`Tokenizer`].

mod config;
mod engine;
mod scheduler;
mod snapshot;

use std::sync::Arc;

pub use config::{MAX_ENTROPY_SIZE, MAX_ID_SIZE, MIN_ENTROPY_SIZE, MIN_ID_SIZE, RotationConfig};
pub use engine::{Rotation, RotationCallback};
pub use scheduler::{ROTATION_RETRY_BACKOFF, RotationHandle};
pub use snapshot::Snapshot;

use crate::Tokenizer;

/// Installs every rotated key pair into `tokenizer`.
pub fn rotation_callback(tokenizer: Arc<dyn Tokenizer>) -> RotationCallback {
    Arc::new(move |present, past| tokenizer.rotate(present, past))
}
