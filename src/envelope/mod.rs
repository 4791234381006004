//! KMS envelope encryption
//!
//! An envelope key names a key-encrypting key (KEK) held by a KMS and a
//! template for data encryption keys (DEKs). Every encryption creates a fresh
//! DEK locally, wraps it under the KEK, and stores the wrapped DEK in front of
//! the payload:
//!
//! ```text
//! u32_be(len(encrypted_dek)) || encrypted_dek || dek_ciphertext
//! ```

mod aead;
mod manager;

pub use self::aead::KmsEnvelopeAead;
pub use self::manager::{
    EnvelopeAeadFactory, KmsEnvelopeAeadKeyFactory, KmsEnvelopeAeadKeyManager,
};

use crate::error::{Error, Result};
use crate::key::encoding::encode;
use crate::key::{
    AesGcmKeyManager, ChaCha20Poly1305KeyManager, KeyManager, KeyManagerImpl, KeyTemplate,
    OutputPrefixType, XChaCha20Poly1305KeyManager, AES_GCM_TYPE_URL, CHACHA20_POLY1305_TYPE_URL,
    XCHACHA20_POLY1305_TYPE_URL,
};
use serde::{Deserialize, Serialize};

/// Type URL of KMS envelope AEAD keys
pub const KMS_ENVELOPE_AEAD_TYPE_URL: &str =
    "type.googleapis.com/google.crypto.tink.KmsEnvelopeAeadKey";

/// DEK key types an envelope may use
pub const SUPPORTED_DEK_KEY_TYPES: &[&str] = &[
    AES_GCM_TYPE_URL,
    CHACHA20_POLY1305_TYPE_URL,
    XCHACHA20_POLY1305_TYPE_URL,
];

/// Parameters of an envelope key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KmsEnvelopeAeadKeyFormat {
    /// URI of the KEK in the remote KMS
    pub kek_uri: String,
    /// Template for the per-message DEK
    pub dek_template: Option<KeyTemplate>,
}

/// An envelope key; holds only a reference to the remote KEK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KmsEnvelopeAeadKey {
    /// Key version
    pub version: u32,
    /// KEK URI and DEK template
    pub params: KmsEnvelopeAeadKeyFormat,
}

/// Returns true if `type_url` may be used as a DEK type
pub fn is_supported_dek_key_type(type_url: &str) -> bool {
    SUPPORTED_DEK_KEY_TYPES.contains(&type_url)
}

/// Returns the manager used to create and load DEKs of `type_url`
///
/// DEK managers are fixed rather than looked up in a registry, so an envelope
/// never depends on what else happens to be registered.
pub(crate) fn dek_key_manager(type_url: &str) -> Option<Box<dyn KeyManager>> {
    match type_url {
        AES_GCM_TYPE_URL => Some(Box::new(KeyManagerImpl::new(AesGcmKeyManager::new()))),
        CHACHA20_POLY1305_TYPE_URL => Some(Box::new(KeyManagerImpl::new(
            ChaCha20Poly1305KeyManager::new(),
        ))),
        XCHACHA20_POLY1305_TYPE_URL => Some(Box::new(KeyManagerImpl::new(
            XChaCha20Poly1305KeyManager::new(),
        ))),
        _ => None,
    }
}

/// Builds a template for envelope keys wrapping DEKs of `dek_template`
///
/// The DEK type is checked before the URI, and no KMS is contacted.
pub fn create_key_template(kek_uri: &str, dek_template: &KeyTemplate) -> Result<KeyTemplate> {
    if !is_supported_dek_key_type(&dek_template.type_url) {
        return Err(Error::UnsupportedDekType(dek_template.type_url.clone()));
    }
    if kek_uri.is_empty() {
        return Err(Error::InvalidArgument("KEK URI must not be empty".into()));
    }

    let format = KmsEnvelopeAeadKeyFormat {
        kek_uri: kek_uri.to_string(),
        dek_template: Some(dek_template.clone()),
    };
    Ok(KeyTemplate::new(
        KMS_ENVELOPE_AEAD_TYPE_URL,
        encode(&format)?,
        OutputPrefixType::Raw,
    ))
}
