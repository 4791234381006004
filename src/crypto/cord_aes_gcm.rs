//! Streaming AES-GCM over [`Cord`] payloads
//!
//! Each input chunk is encrypted (or decrypted) into its own output chunk
//! while GHASH absorbs the ciphertext incrementally. The output is
//! byte-for-byte the layout produced by [`AesGcm`](crate::crypto::AesGcm):
//! `nonce (12) || ciphertext || tag (16)`.

use crate::crypto::aead::{fill_random, GCM_MAX_DATA_SIZE, GCM_NONCE_SIZE, TAG_SIZE};
use crate::crypto::cord::Cord;
use crate::error::{Error, Result};
use crate::CordAead;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use bytes::BytesMut;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ghash::universal_hash::UniversalHash;
use ghash::GHash;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

const BLOCK_SIZE: usize = 16;

type Aes128Ctr = ctr::Ctr32BE<Aes128>;
type Aes256Ctr = ctr::Ctr32BE<Aes256>;

enum Keystream {
    Aes128(Aes128Ctr),
    Aes256(Aes256Ctr),
}

impl Keystream {
    fn apply(&mut self, buf: &mut [u8]) {
        match self {
            Keystream::Aes128(c) => c.apply_keystream(buf),
            Keystream::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

fn encrypt_block<C: BlockEncrypt>(cipher: &C, input: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut block = aes::cipher::Block::<C>::clone_from_slice(input);
    cipher.encrypt_block(&mut block);
    let mut out = [0_u8; BLOCK_SIZE];
    out.copy_from_slice(&block);
    out
}

/// GHASH accumulator that tolerates input split at arbitrary offsets
struct GhashStream {
    ghash: GHash,
    pending: [u8; BLOCK_SIZE],
    pending_len: usize,
}

impl GhashStream {
    fn new(h: &[u8; BLOCK_SIZE]) -> Self {
        let key = ghash::Key::clone_from_slice(h);
        Self {
            ghash: GHash::new(&key),
            pending: [0_u8; BLOCK_SIZE],
            pending_len: 0,
        }
    }

    fn update(&mut self, mut data: &[u8]) {
        if self.pending_len > 0 {
            let take = (BLOCK_SIZE - self.pending_len).min(data.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&data[..take]);
            self.pending_len += take;
            data = &data[take..];

            if self.pending_len < BLOCK_SIZE {
                return;
            }
            self.ghash.update_padded(&self.pending);
            self.pending_len = 0;
        }

        let full = data.len() - data.len() % BLOCK_SIZE;
        if full > 0 {
            self.ghash.update_padded(&data[..full]);
        }

        let rest = &data[full..];
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }

    /// Zero-pads the current partial block, ending a GHASH section
    fn pad(&mut self) {
        if self.pending_len > 0 {
            self.ghash.update_padded(&self.pending[..self.pending_len]);
            self.pending_len = 0;
        }
    }

    fn finalize(mut self, aad_len: usize, ct_len: usize) -> [u8; BLOCK_SIZE] {
        self.pad();
        let mut lengths = [0_u8; BLOCK_SIZE];
        lengths[..8].copy_from_slice(&((aad_len as u64) * 8).to_be_bytes());
        lengths[8..].copy_from_slice(&((ct_len as u64) * 8).to_be_bytes());
        self.ghash.update_padded(&lengths);

        let mut out = [0_u8; BLOCK_SIZE];
        out.copy_from_slice(&self.ghash.finalize());
        out
    }
}

/// Per-message GCM state
struct GcmState {
    keystream: Keystream,
    ghash: GhashStream,
    tag_mask: [u8; BLOCK_SIZE],
}

impl GcmState {
    fn new(key: &[u8], nonce: &[u8; GCM_NONCE_SIZE]) -> Result<Self> {
        let mut j0 = [0_u8; BLOCK_SIZE];
        j0[..GCM_NONCE_SIZE].copy_from_slice(nonce);
        j0[BLOCK_SIZE - 1] = 1;

        // Payload keystream starts at inc32(J0)
        let mut counter = j0;
        counter[BLOCK_SIZE - 1] = 2;

        let invalid = |_| Error::UnsupportedKeyParameters("invalid AES-GCM key".into());
        let zero = [0_u8; BLOCK_SIZE];
        let (h, tag_mask, keystream) = match key.len() {
            16 => {
                let cipher = Aes128::new_from_slice(key).map_err(invalid)?;
                let ctr = Aes128Ctr::new_from_slices(key, &counter).map_err(invalid)?;
                (
                    encrypt_block(&cipher, &zero),
                    encrypt_block(&cipher, &j0),
                    Keystream::Aes128(ctr),
                )
            }
            32 => {
                let cipher = Aes256::new_from_slice(key).map_err(invalid)?;
                let ctr = Aes256Ctr::new_from_slices(key, &counter).map_err(invalid)?;
                (
                    encrypt_block(&cipher, &zero),
                    encrypt_block(&cipher, &j0),
                    Keystream::Aes256(ctr),
                )
            }
            n => {
                return Err(Error::UnsupportedKeyParameters(format!(
                    "AES-GCM key size {} not supported",
                    n
                )))
            }
        };

        Ok(Self {
            keystream,
            ghash: GhashStream::new(&h),
            tag_mask,
        })
    }

    fn absorb_associated_data(&mut self, associated_data: &Cord) {
        for chunk in associated_data.chunks() {
            self.ghash.update(chunk);
        }
        self.ghash.pad();
    }

    fn tag(self, aad_len: usize, ct_len: usize) -> [u8; BLOCK_SIZE] {
        let mut tag = self.ghash.finalize(aad_len, ct_len);
        for (t, m) in tag.iter_mut().zip(self.tag_mask.iter()) {
            *t ^= m;
        }
        tag
    }
}

/// AES-GCM [`CordAead`] that never flattens its input
pub struct CordAesGcm {
    key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for CordAesGcm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CordAesGcm")
            .field("key_size", &self.key.len())
            .field("key", &"<hidden>")
            .finish()
    }
}

impl CordAesGcm {
    /// Creates a new cord AES-GCM primitive; the key must be 16 or 32 bytes
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 16 && key.len() != 32 {
            return Err(Error::UnsupportedKeyParameters(format!(
                "AES-GCM key size {} not supported",
                key.len()
            )));
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }
}

impl CordAead for CordAesGcm {
    fn encrypt(&self, plaintext: &Cord, associated_data: &Cord) -> Result<Cord> {
        if plaintext.len() as u64 > GCM_MAX_DATA_SIZE {
            return Err(Error::EncryptionFailed("plaintext too large for GCM".into()));
        }

        let mut nonce = [0_u8; GCM_NONCE_SIZE];
        fill_random(&mut nonce);
        self.seal(&nonce, plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &Cord, associated_data: &Cord) -> Result<Cord> {
        self.open(ciphertext, associated_data)
    }
}

impl CordAesGcm {
    fn seal(
        &self,
        nonce: &[u8; GCM_NONCE_SIZE],
        plaintext: &Cord,
        associated_data: &Cord,
    ) -> Result<Cord> {
        let mut state = GcmState::new(&self.key, nonce)?;
        state.absorb_associated_data(associated_data);

        let mut out = Cord::new();
        out.append(nonce.to_vec());
        for chunk in plaintext.chunks() {
            let mut buf = BytesMut::from(chunk);
            state.keystream.apply(&mut buf);
            state.ghash.update(&buf);
            out.append(buf.freeze());
        }

        let tag = state.tag(associated_data.len(), plaintext.len());
        out.append(tag.to_vec());
        Ok(out)
    }

    fn open(&self, ciphertext: &Cord, associated_data: &Cord) -> Result<Cord> {
        let min = GCM_NONCE_SIZE + TAG_SIZE;
        if ciphertext.len() < min {
            return Err(Error::InputTooShort {
                len: ciphertext.len(),
                min,
            });
        }

        let body_end = ciphertext.len() - TAG_SIZE;
        let nonce: [u8; GCM_NONCE_SIZE] = ciphertext
            .copy_array(0)
            .ok_or_else(|| Error::MalformedEnvelope("missing nonce".into()))?;
        let expected: [u8; TAG_SIZE] = ciphertext
            .copy_array(body_end)
            .ok_or_else(|| Error::MalformedEnvelope("missing tag".into()))?;

        let mut state = GcmState::new(&self.key, &nonce)?;
        state.absorb_associated_data(associated_data);

        let body = ciphertext.slice(GCM_NONCE_SIZE, body_end);
        let mut out = Cord::new();
        for chunk in body.chunks() {
            state.ghash.update(chunk);
            let mut buf = BytesMut::from(chunk);
            state.keystream.apply(&mut buf);
            out.append(buf.freeze());
        }

        let actual = state.tag(associated_data.len(), body.len());
        if bool::from(actual.ct_eq(&expected)) {
            Ok(out)
        } else {
            Err(Error::AuthenticationFailed)
        }
    }
}
