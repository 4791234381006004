use crate::crypto::aes_gcm::AES_GCM_KEY_SIZES;
use crate::crypto::{random_bytes, AesGcm, CordAesGcm};
use crate::error::{Error, Result};
use crate::key::encoding::base64_secret;
use crate::key::{
    validate_format_version, validate_version, KeyFactory, KeyMaterialKind, KeyTypeManager,
    Primitive, PrimitiveKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Type URL of AES-GCM keys
pub const AES_GCM_TYPE_URL: &str = "type.googleapis.com/google.crypto.tink.AesGcmKey";

const VERSION: u32 = 0;
const PRIMITIVES: &[PrimitiveKind] = &[PrimitiveKind::Aead, PrimitiveKind::CordAead];

/// Parameters for a new AES-GCM key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AesGcmKeyFormat {
    /// Key size in bytes, 16 or 32
    pub key_size: u32,
    /// Format version
    pub version: u32,
}

/// An AES-GCM key
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AesGcmKey {
    /// Key version
    pub version: u32,
    /// Raw key bytes
    #[serde(with = "base64_secret")]
    pub key_value: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for AesGcmKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmKey")
            .field("version", &self.version)
            .field("key_size", &self.key_value.len())
            .finish()
    }
}

fn is_valid_key_size(size: usize) -> bool {
    AES_GCM_KEY_SIZES.contains(&size)
}

/// Creates random AES-GCM keys
#[derive(Debug, Default)]
pub struct AesGcmKeyFactory;

impl KeyFactory for AesGcmKeyFactory {
    type Key = AesGcmKey;
    type KeyFormat = AesGcmKeyFormat;

    fn validate_key_format(&self, format: &AesGcmKeyFormat) -> Result<()> {
        validate_format_version(format.version, VERSION)?;
        if !is_valid_key_size(format.key_size as usize) {
            return Err(Error::InvalidKeyFormat(format!(
                "AES-GCM key size {} not supported",
                format.key_size
            )));
        }
        Ok(())
    }

    fn create_key(&self, format: &AesGcmKeyFormat) -> Result<AesGcmKey> {
        Ok(AesGcmKey {
            version: VERSION,
            key_value: Zeroizing::new(random_bytes(format.key_size as usize)),
        })
    }
}

/// Manager for AES-GCM keys; builds [`AesGcm`] and [`CordAesGcm`]
#[derive(Debug, Default)]
pub struct AesGcmKeyManager {
    factory: AesGcmKeyFactory,
}

impl AesGcmKeyManager {
    /// Creates a new manager
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyTypeManager for AesGcmKeyManager {
    type Key = AesGcmKey;
    type Factory = AesGcmKeyFactory;

    fn key_type(&self) -> &str {
        AES_GCM_TYPE_URL
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

    fn validate_key(&self, key: &AesGcmKey) -> Result<()> {
        validate_version(key.version, VERSION)?;
        if !is_valid_key_size(key.key_value.len()) {
            return Err(Error::UnsupportedKeyParameters(format!(
                "AES-GCM key size {} not supported",
                key.key_value.len()
            )));
        }
        Ok(())
    }

    fn key_factory(&self) -> &AesGcmKeyFactory {
        &self.factory
    }

    fn primitive(&self, key: &AesGcmKey, kind: PrimitiveKind) -> Result<Primitive> {
        match kind {
            PrimitiveKind::Aead => Ok(Primitive::Aead(Arc::new(AesGcm::new(&key.key_value)?))),
            PrimitiveKind::CordAead => Ok(Primitive::CordAead(Arc::new(CordAesGcm::new(
                &key.key_value,
            )?))),
        }
    }
}
