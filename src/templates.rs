//! Predefined key templates for the built-in AEAD key types

use crate::error::Result;
use crate::key::encoding::encode;
use crate::key::{
    AesGcmKeyFormat, ChaCha20Poly1305KeyFormat, KeyTemplate, OutputPrefixType, AES_GCM_TYPE_URL,
    CHACHA20_POLY1305_TYPE_URL, XCHACHA20_POLY1305_TYPE_URL,
};
use serde::Serialize;

fn template<F: Serialize>(type_url: &str, format: &F) -> Result<KeyTemplate> {
    Ok(KeyTemplate::new(type_url, encode(format)?, OutputPrefixType::Tink))
}

fn aes_gcm(key_size: u32) -> Result<KeyTemplate> {
    template(
        AES_GCM_TYPE_URL,
        &AesGcmKeyFormat {
            key_size,
            version: 0,
        },
    )
}

/// AES-128-GCM
pub fn aes128_gcm() -> Result<KeyTemplate> {
    aes_gcm(16)
}

/// AES-256-GCM
pub fn aes256_gcm() -> Result<KeyTemplate> {
    aes_gcm(32)
}

/// ChaCha20-Poly1305
pub fn chacha20_poly1305() -> Result<KeyTemplate> {
    template(
        CHACHA20_POLY1305_TYPE_URL,
        &ChaCha20Poly1305KeyFormat::default(),
    )
}

/// XChaCha20-Poly1305
pub fn xchacha20_poly1305() -> Result<KeyTemplate> {
    template(
        XCHACHA20_POLY1305_TYPE_URL,
        &ChaCha20Poly1305KeyFormat::default(),
    )
}
