//! Identity primitives
//!
//! A file manager instance is bound to a single Ed25519 keypair:
//!
//! - **[`SecretKey`]**: held by the process that owns the feed; the only key
//!   that may publish new manifest roots under its topic
//! - **[`PublicKey`]**: the owner identity other readers use to look the
//!   feed up
//!
//! Feed updates are signed over `topic || index || reference` and verified on
//! read, so a tampered or foreign update is rejected rather than loaded.

mod keys;

pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
