//! Key material, templates and the key-type manager contracts
//!
//! Every key type is handled by one [`KeyTypeManager`]. The registry only
//! ever sees the erased [`KeyManager`] view, so new key types can be plugged
//! in at runtime without the registry knowing their concrete types.

pub mod aes_gcm;
pub mod chacha;
pub(crate) mod encoding;
mod manager;

pub use self::aes_gcm::{AesGcmKey, AesGcmKeyFormat, AesGcmKeyManager, AES_GCM_TYPE_URL};
pub use self::chacha::{
    ChaCha20Poly1305Key, ChaCha20Poly1305KeyFormat, ChaCha20Poly1305KeyManager,
    XChaCha20Poly1305KeyManager, CHACHA20_POLY1305_TYPE_URL, XCHACHA20_POLY1305_TYPE_URL,
};
pub use self::manager::{
    validate_format_version, validate_version, KeyFactory, KeyManager, KeyManagerImpl,
    KeyTypeManager,
};

use self::encoding::{base64_bytes, base64_secret};
use crate::error::{Error, Result};
use crate::{Aead, CordAead};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// What kind of secret, if any, a key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyMaterialKind {
    /// A local symmetric secret
    Symmetric,
    /// A local private key
    AsymmetricPrivate,
    /// A public key
    AsymmetricPublic,
    /// A reference to a key held by an external service; no local secret
    Remote,
}

/// How ciphertexts produced under a key are prefixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputPrefixType {
    /// Version byte and key id
    Tink,
    /// Legacy prefix
    Legacy,
    /// No prefix
    Raw,
    /// Legacy prefix without the trailing format byte
    Crunchy,
}

/// Recipe for creating new keys of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyTemplate {
    /// Type URL of the keys this template produces
    pub type_url: String,
    /// Serialized key format
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
    /// Output prefix applied to ciphertexts
    pub output_prefix_type: OutputPrefixType,
}

impl KeyTemplate {
    /// Creates a template from a type URL and a serialized key format
    pub fn new(
        type_url: impl Into<String>,
        value: Vec<u8>,
        output_prefix_type: OutputPrefixType,
    ) -> Self {
        Self {
            type_url: type_url.into(),
            value,
            output_prefix_type,
        }
    }
}

/// A serialized key tagged with its type
///
/// This is the unit the registry turns into primitives.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyData {
    /// Type URL of the serialized key
    pub type_url: String,
    /// Serialized key; wiped on drop
    #[serde(with = "base64_secret")]
    pub value: Zeroizing<Vec<u8>>,
    /// Material kind of the key
    pub key_material_kind: KeyMaterialKind,
}

impl KeyData {
    /// Creates key data, taking ownership of the serialized key
    pub fn new(
        type_url: impl Into<String>,
        value: Vec<u8>,
        key_material_kind: KeyMaterialKind,
    ) -> Self {
        Self {
            type_url: type_url.into(),
            value: Zeroizing::new(value),
            key_material_kind,
        }
    }
}

impl fmt::Debug for KeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyData")
            .field("type_url", &self.type_url)
            .field("value", &"<hidden>")
            .field("key_material_kind", &self.key_material_kind)
            .finish()
    }
}

/// The capabilities a manager can build from a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    /// [`Aead`] over contiguous buffers
    Aead,
    /// [`CordAead`] over chunked buffers
    CordAead,
}

/// A primitive built by a key manager
#[derive(Debug, Clone)]
pub enum Primitive {
    /// Contiguous-buffer AEAD
    Aead(Arc<dyn Aead>),
    /// Chunked-buffer AEAD
    CordAead(Arc<dyn CordAead>),
}

impl Primitive {
    /// Returns the kind of this primitive
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Aead(_) => PrimitiveKind::Aead,
            Primitive::CordAead(_) => PrimitiveKind::CordAead,
        }
    }

    /// Unwraps an [`Aead`], failing for any other kind
    pub fn into_aead(self) -> Result<Arc<dyn Aead>> {
        match self {
            Primitive::Aead(aead) => Ok(aead),
            other => Err(Error::UnsupportedPrimitive(format!(
                "expected Aead, got {:?}",
                other.kind()
            ))),
        }
    }

    /// Unwraps a [`CordAead`], failing for any other kind
    pub fn into_cord_aead(self) -> Result<Arc<dyn CordAead>> {
        match self {
            Primitive::CordAead(aead) => Ok(aead),
            other => Err(Error::UnsupportedPrimitive(format!(
                "expected CordAead, got {:?}",
                other.kind()
            ))),
        }
    }
}
