use crate::crypto::aead::{open, seal};
use crate::error::{Error, Result};
use crate::Aead;
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit};

/// Key sizes accepted by AES-GCM, in bytes
pub const AES_GCM_KEY_SIZES: [usize; 2] = [16, 32];

enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes256(Box<Aes256Gcm>),
}

/// AES-GCM implementation of [`Aead`] bound to a single key
///
/// Output layout is `nonce (12) || ciphertext || tag (16)`.
pub struct AesGcm {
    cipher: Cipher,
}

impl std::fmt::Debug for AesGcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcm")
            .field("key_size", &self.key_size())
            .field("key", &"<hidden>")
            .finish()
    }
}

impl AesGcm {
    /// Creates a new AES-GCM primitive; the key must be 16 or 32 bytes
    pub fn new(key: &[u8]) -> Result<Self> {
        let invalid = |_| Error::UnsupportedKeyParameters("invalid AES-GCM key".into());
        let cipher = match key.len() {
            16 => Cipher::Aes128(Box::new(Aes128Gcm::new_from_slice(key).map_err(invalid)?)),
            32 => Cipher::Aes256(Box::new(Aes256Gcm::new_from_slice(key).map_err(invalid)?)),
            n => {
                return Err(Error::UnsupportedKeyParameters(format!(
                    "AES-GCM key size {} not in {:?}",
                    n, AES_GCM_KEY_SIZES
                )))
            }
        };

        Ok(Self { cipher })
    }

    /// Returns the key size in bytes
    pub fn key_size(&self) -> usize {
        match self.cipher {
            Cipher::Aes128(_) => 16,
            Cipher::Aes256(_) => 32,
        }
    }
}

impl Aead for AesGcm {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        match &self.cipher {
            Cipher::Aes128(c) => seal(c.as_ref(), plaintext, associated_data),
            Cipher::Aes256(c) => seal(c.as_ref(), plaintext, associated_data),
        }
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        match &self.cipher {
            Cipher::Aes128(c) => open(c.as_ref(), ciphertext, associated_data),
            Cipher::Aes256(c) => open(c.as_ref(), ciphertext, associated_data),
        }
    }
}
