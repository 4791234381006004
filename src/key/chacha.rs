//! ChaCha20-Poly1305 and XChaCha20-Poly1305 key managers
//!
//! Both variants use the same 32-byte key layout and differ only in nonce
//! size, so they share key, format and factory types.

use crate::crypto::chacha::CHACHA20_POLY1305_KEY_SIZE;
use crate::crypto::{random_bytes, ChaCha20Poly1305Aead, XChaCha20Poly1305Aead};
use crate::error::{Error, Result};
use crate::key::encoding::base64_secret;
use crate::key::{
    validate_format_version, validate_version, KeyFactory, KeyMaterialKind, KeyTypeManager,
    Primitive, PrimitiveKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Type URL of ChaCha20-Poly1305 keys
pub const CHACHA20_POLY1305_TYPE_URL: &str =
    "type.googleapis.com/google.crypto.tink.ChaCha20Poly1305Key";

/// Type URL of XChaCha20-Poly1305 keys
pub const XCHACHA20_POLY1305_TYPE_URL: &str =
    "type.googleapis.com/google.crypto.tink.XChaCha20Poly1305Key";

const VERSION: u32 = 0;
const PRIMITIVES: &[PrimitiveKind] = &[PrimitiveKind::Aead];

/// Parameters for a new ChaCha20-Poly1305 or XChaCha20-Poly1305 key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChaCha20Poly1305KeyFormat {
    /// Format version
    pub version: u32,
}

/// A ChaCha20-Poly1305 or XChaCha20-Poly1305 key
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChaCha20Poly1305Key {
    /// Key version
    pub version: u32,
    /// Raw 32-byte key
    #[serde(with = "base64_secret")]
    pub key_value: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for ChaCha20Poly1305Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaCha20Poly1305Key")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

fn validate_key(key: &ChaCha20Poly1305Key) -> Result<()> {
    validate_version(key.version, VERSION)?;
    if key.key_value.len() != CHACHA20_POLY1305_KEY_SIZE {
        return Err(Error::UnsupportedKeyParameters(format!(
            "key must be {} bytes, got {}",
            CHACHA20_POLY1305_KEY_SIZE,
            key.key_value.len()
        )));
    }
    Ok(())
}

/// Creates random 32-byte keys for both variants
#[derive(Debug, Default)]
pub struct ChaCha20Poly1305KeyFactory;

impl KeyFactory for ChaCha20Poly1305KeyFactory {
    type Key = ChaCha20Poly1305Key;
    type KeyFormat = ChaCha20Poly1305KeyFormat;

    fn validate_key_format(&self, format: &ChaCha20Poly1305KeyFormat) -> Result<()> {
        validate_format_version(format.version, VERSION)
    }

    fn create_key(&self, _format: &ChaCha20Poly1305KeyFormat) -> Result<ChaCha20Poly1305Key> {
        Ok(ChaCha20Poly1305Key {
            version: VERSION,
            key_value: Zeroizing::new(random_bytes(CHACHA20_POLY1305_KEY_SIZE)),
        })
    }
}

/// Manager for ChaCha20-Poly1305 keys (12-byte nonce)
#[derive(Debug, Default)]
pub struct ChaCha20Poly1305KeyManager {
    factory: ChaCha20Poly1305KeyFactory,
}

impl ChaCha20Poly1305KeyManager {
    /// Creates a new manager
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyTypeManager for ChaCha20Poly1305KeyManager {
    type Key = ChaCha20Poly1305Key;
    type Factory = ChaCha20Poly1305KeyFactory;

    fn key_type(&self) -> &str {
        CHACHA20_POLY1305_TYPE_URL
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn key_material_kind(&self) -> KeyMaterialKind {
        KeyMaterialKind::Symmetric
    }

    fn supported_primitives(&self) -> &[PrimitiveKind] {
        PRIMITIVES
    }

    fn validate_key(&self, key: &ChaCha20Poly1305Key) -> Result<()> {
        validate_key(key)
    }

    fn key_factory(&self) -> &ChaCha20Poly1305KeyFactory {
        &self.factory
    }

    fn primitive(&self, key: &ChaCha20Poly1305Key, kind: PrimitiveKind) -> Result<Primitive> {
        match kind {
            PrimitiveKind::Aead => Ok(Primitive::Aead(Arc::new(ChaCha20Poly1305Aead::new(
                &key.key_value,
            )?))),
            other => Err(Error::UnsupportedPrimitive(format!("{:?}", other))),
        }
    }
}

/// Manager for XChaCha20-Poly1305 keys (24-byte nonce)
#[derive(Debug, Default)]
pub struct XChaCha20Poly1305KeyManager {
    factory: ChaCha20Poly1305KeyFactory,
}

impl XChaCha20Poly1305KeyManager {
    /// Creates a new manager
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyTypeManager for XChaCha20Poly1305KeyManager {
    type Key = ChaCha20Poly1305Key;
    type Factory = ChaCha20Poly1305KeyFactory;

    fn key_type(&self) -> &str {
        XCHACHA20_POLY1305_TYPE_URL
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn key_material_kind(&self) -> KeyMaterialKind {
        KeyMaterialKind::Symmetric
    }

    fn supported_primitives(&self) -> &[PrimitiveKind] {
        PRIMITIVES
    }

    fn validate_key(&self, key: &ChaCha20Poly1305Key) -> Result<()> {
        validate_key(key)
    }

    fn key_factory(&self) -> &ChaCha20Poly1305KeyFactory {
        &self.factory
    }

    fn primitive(&self, key: &ChaCha20Poly1305Key, kind: PrimitiveKind) -> Result<Primitive> {
        match kind {
            PrimitiveKind::Aead => Ok(Primitive::Aead(Arc::new(XChaCha20Poly1305Aead::new(
                &key.key_value,
            )?))),
            other => Err(Error::UnsupportedPrimitive(format!("{:?}", other))),
        }
    }
}
