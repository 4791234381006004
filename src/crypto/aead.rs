use crate::error::{Error, Result};
use aes_gcm::aead::{Aead as AeadTrait, Nonce, Payload};
use rand::{rngs::OsRng, RngCore};

// Nonce and tag sizes shared by the GCM and ChaCha20-Poly1305 families
pub(crate) const GCM_NONCE_SIZE: usize = 12;
pub(crate) const XCHACHA_NONCE_SIZE: usize = 24;
pub(crate) const TAG_SIZE: usize = 16;

// Maximum message size supported by GCM
// ((1 << 32) - 2) * block size
pub(crate) const GCM_MAX_DATA_SIZE: u64 = ((1 << 32) - 2) * 16;

/// Fills a buffer with random bytes using a cryptographically secure RNG
///
/// `OsRng` blocks until the operating system pool is seeded; it never falls
/// back to a weaker source.
pub fn fill_random(buffer: &mut [u8]) {
    OsRng.fill_bytes(buffer);
}

/// Generates a random byte vector of the given size
pub fn random_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0_u8; size];
    fill_random(&mut bytes);
    bytes
}

/// Encrypts with a fresh random nonce and returns `nonce || ciphertext || tag`
pub(crate) fn seal<C: AeadTrait>(
    cipher: &C,
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>> {
    let mut nonce = Nonce::<C>::default();
    fill_random(&mut nonce);

    let sealed = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(nonce.len() + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Splits `nonce || ciphertext || tag` and decrypts it
pub(crate) fn open<C: AeadTrait>(
    cipher: &C,
    ciphertext: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>> {
    let nonce_size = Nonce::<C>::default().len();
    let min = nonce_size + TAG_SIZE;
    if ciphertext.len() < min {
        return Err(Error::InputTooShort {
            len: ciphertext.len(),
            min,
        });
    }

    let (nonce, body) = ciphertext.split_at(nonce_size);
    cipher
        .decrypt(
            Nonce::<C>::from_slice(nonce),
            Payload {
                msg: body,
                aad: associated_data,
            },
        )
        .map_err(|_| Error::AuthenticationFailed)
}
