use crate::crypto::aead::{open, seal};
use crate::error::{Error, Result};
use crate::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, XChaCha20Poly1305};

/// Key size of both ChaCha20-Poly1305 variants, in bytes
pub const CHACHA20_POLY1305_KEY_SIZE: usize = 32;

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() != CHACHA20_POLY1305_KEY_SIZE {
        return Err(Error::UnsupportedKeyParameters(format!(
            "ChaCha20-Poly1305 key must be {} bytes, got {}",
            CHACHA20_POLY1305_KEY_SIZE,
            key.len()
        )));
    }
    Ok(())
}

/// ChaCha20-Poly1305 (RFC 8439) with a 12-byte random nonce
pub struct ChaCha20Poly1305Aead {
    cipher: ChaCha20Poly1305,
}

impl ChaCha20Poly1305Aead {
    /// Creates a new primitive from a 32-byte key
    pub fn new(key: &[u8]) -> Result<Self> {
        check_key(key)?;
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| Error::UnsupportedKeyParameters("invalid ChaCha20 key".into()))?;
        Ok(Self { cipher })
    }
}

impl std::fmt::Debug for ChaCha20Poly1305Aead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChaCha20Poly1305Aead { key: <hidden> }")
    }
}

impl Aead for ChaCha20Poly1305Aead {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        seal(&self.cipher, plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        open(&self.cipher, ciphertext, associated_data)
    }
}

/// XChaCha20-Poly1305 with a 24-byte random nonce
pub struct XChaCha20Poly1305Aead {
    cipher: XChaCha20Poly1305,
}

impl XChaCha20Poly1305Aead {
    /// Creates a new primitive from a 32-byte key
    pub fn new(key: &[u8]) -> Result<Self> {
        check_key(key)?;
        let cipher = XChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| Error::UnsupportedKeyParameters("invalid XChaCha20 key".into()))?;
        Ok(Self { cipher })
    }
}

impl std::fmt::Debug for XChaCha20Poly1305Aead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("XChaCha20Poly1305Aead { key: <hidden> }")
    }
}

impl Aead for XChaCha20Poly1305Aead {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        seal(&self.cipher, plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        open(&self.cipher, ciphertext, associated_data)
    }
}
