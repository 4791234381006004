//! # Crypto Agility Library
//!
//! A registry of pluggable, versioned key types and a KMS envelope AEAD.
//!
//! Every key type is handled by a key manager that parses, validates and
//! versions its keys and turns them into primitives. Managers are registered
//! by type URL in a [`Registry`](registry::Registry), so callers holding
//! serialized key data never need to know the concrete key type.
//!
//! Envelope keys reference a key-encrypting key held by an external key
//! management service. Each encryption generates a fresh data encryption key
//! locally, wraps it with the remote key, and prepends the wrapped key to the
//! ciphertext.
//!
//! ## Basic Usage
//!
//! ```rust
//! use cryptoagility::config::AeadConfig;
//! use cryptoagility::envelope::create_key_template;
//! use cryptoagility::kms::{KmsClients, StaticKmsClient};
//! use cryptoagility::registry::Registry;
//! use cryptoagility::{templates, Aead};
//! use std::sync::Arc;
//!
//! # fn main() -> cryptoagility::Result<()> {
//! // A local KMS client; in production this adapts a cloud KMS
//! let kms = Arc::new(KmsClients::new());
//! kms.register(Arc::new(
//!     StaticKmsClient::new("static://").with_key("static://kek", &[0_u8; 32])?,
//! ))?;
//!
//! let registry = Registry::new();
//! AeadConfig::new().register(&registry, kms)?;
//!
//! // Envelope key wrapping AES-128-GCM data keys
//! let template = create_key_template("static://kek", &templates::aes128_gcm()?)?;
//! let key_data = registry.new_key_data(&template)?;
//! let aead = registry.get_aead(&key_data)?;
//!
//! let ciphertext = aead.encrypt(b"secret data", b"context")?;
//! assert_eq!(aead.decrypt(&ciphertext, b"context")?, b"secret data");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod key;
pub mod kms;
pub mod metrics;
pub mod registry;
pub mod templates;


// Re-export key types
pub use crate::crypto::Cord;
pub use crate::envelope::{KmsEnvelopeAead, KmsEnvelopeAeadKeyManager};
pub use crate::error::{Error, ErrorCategory, Result};
pub use crate::key::{
    KeyData, KeyManager, KeyMaterialKind, KeyTemplate, KeyTypeManager, OutputPrefixType,
    Primitive, PrimitiveKind,
};
pub use crate::kms::{KmsClients, StaticKmsClient};
pub use crate::registry::Registry;

use std::fmt;
use std::sync::Arc;

/// AEAD (Authenticated Encryption with Associated Data) interface
///
/// Ciphertexts are `nonce || body || tag`; the nonce is random per call.
/// Authentication failure is reported as [`Error::AuthenticationFailed`].
pub trait Aead: Send + Sync + fmt::Debug {
    /// Encrypts `plaintext`, authenticating `associated_data`
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts `ciphertext`, verifying `associated_data`
    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
}

/// AEAD interface over chunked [`Cord`] buffers
pub trait CordAead: Send + Sync + fmt::Debug {
    /// Encrypts `plaintext`, authenticating `associated_data`
    fn encrypt(&self, plaintext: &Cord, associated_data: &Cord) -> Result<Cord>;

    /// Decrypts `ciphertext`, verifying `associated_data`
    fn decrypt(&self, ciphertext: &Cord, associated_data: &Cord) -> Result<Cord>;
}

/// Key Management Service client interface
///
/// A client serves every key URI that starts with its prefix and hands out
/// an [`Aead`] bound to the named remote key. Calls on that `Aead` block on
/// the service; the crate never retries them.
pub trait KmsClient: Send + Sync + fmt::Debug {
    /// URI prefix this client serves, e.g. `aws-kms://`
    fn key_uri_prefix(&self) -> &str;

    /// Returns true if this client serves `key_uri`
    fn does_support(&self, key_uri: &str) -> bool {
        key_uri.starts_with(self.key_uri_prefix())
    }

    /// Returns an [`Aead`] backed by the remote key at `key_uri`
    fn get_aead(&self, key_uri: &str) -> Result<Arc<dyn Aead>>;
}

/// Registers a key manager in the global registry
pub fn register_key_manager(manager: Arc<dyn KeyManager>, allow_overwrite: bool) -> Result<()> {
    Registry::global().register_key_manager(manager, allow_overwrite)
}

/// Registers a KMS client in the global client registry
pub fn register_kms_client(client: Arc<dyn KmsClient>) -> Result<()> {
    KmsClients::global().register(client)
}
