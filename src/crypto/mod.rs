//! Local AEAD engines
//!
//! Every primitive here produces `nonce || ciphertext || tag`, with a fresh
//! random nonce per call and a 16-byte tag.

pub(crate) mod aead;
pub mod aes_gcm;
pub mod chacha;
pub mod cord;
pub mod cord_aes_gcm;

pub use self::aead::{fill_random, random_bytes};
pub use self::aes_gcm::AesGcm;
pub use chacha::{ChaCha20Poly1305Aead, XChaCha20Poly1305Aead};
pub use cord::Cord;
pub use cord_aes_gcm::CordAesGcm;
