use crate::envelope::dek_key_manager;
use crate::error::{Error, Result};
use crate::key::{KeyManager, KeyTemplate, Primitive, PrimitiveKind};
use crate::metrics::{
    ENVELOPE_DECRYPT, ENVELOPE_DECRYPT_TIME, ENVELOPE_ENCRYPT, ENVELOPE_ENCRYPT_TIME,
    ENVELOPE_UNWRAP_FAILURES,
};
use crate::timer;
use crate::Aead;
use log::warn;
use metrics::counter;
use std::sync::Arc;
use zeroize::Zeroizing;

const LENGTH_PREFIX_SIZE: usize = 4;

// The wrap step binds no associated data
const WRAP_ASSOCIATED_DATA: &[u8] = b"";

/// [`Aead`] that encrypts each message under a fresh DEK wrapped by a remote KEK
///
/// Output layout is `u32_be(len) || encrypted_dek || dek_ciphertext`. The
/// caller's associated data binds only the payload, never the wrapped DEK.
pub struct KmsEnvelopeAead {
    dek_template: KeyTemplate,
    dek_manager: Box<dyn KeyManager>,
    remote: Arc<dyn Aead>,
}

impl std::fmt::Debug for KmsEnvelopeAead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsEnvelopeAead")
            .field("dek_type_url", &self.dek_template.type_url)
            .field("remote", &self.remote)
            .finish()
    }
}

impl KmsEnvelopeAead {
    /// Creates an envelope AEAD
    ///
    /// Fails with [`Error::UnsupportedDekType`] if the template does not name
    /// a supported AEAD key type.
    pub fn new(dek_template: KeyTemplate, remote: Arc<dyn Aead>) -> Result<Self> {
        let dek_manager = dek_key_manager(&dek_template.type_url)
            .ok_or_else(|| Error::UnsupportedDekType(dek_template.type_url.clone()))?;

        Ok(Self {
            dek_template,
            dek_manager,
            remote,
        })
    }

    fn dek_aead(&self, dek: &[u8]) -> Result<Arc<dyn Aead>> {
        self.dek_manager
            .primitive(dek, PrimitiveKind::Aead)
            .and_then(Primitive::into_aead)
    }
}

fn unwrap_failed(cause: Error) -> Error {
    counter!(ENVELOPE_UNWRAP_FAILURES, 1);
    warn!("envelope DEK unwrap failed: {}", cause);
    Error::EnvelopeDekUnwrapFailed(Box::new(cause))
}

impl Aead for KmsEnvelopeAead {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let _timer = timer!(ENVELOPE_ENCRYPT_TIME);
        counter!(ENVELOPE_ENCRYPT, 1);

        let dek = self.dek_manager.new_key(&self.dek_template.value)?;
        let encrypted_dek = self.remote.encrypt(&dek, WRAP_ASSOCIATED_DATA)?;

        if encrypted_dek.is_empty() {
            return Err(Error::EncryptionFailed(
                "KMS returned an empty wrapped key".into(),
            ));
        }
        let encrypted_dek_len = i32::try_from(encrypted_dek.len()).map_err(|_| {
            Error::EncryptionFailed("wrapped key too long for the length prefix".into())
        })?;

        let payload = self.dek_aead(&dek)?.encrypt(plaintext, associated_data)?;

        let mut out =
            Vec::with_capacity(LENGTH_PREFIX_SIZE + encrypted_dek.len() + payload.len());
        out.extend_from_slice(&encrypted_dek_len.to_be_bytes());
        out.extend_from_slice(&encrypted_dek);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let _timer = timer!(ENVELOPE_DECRYPT_TIME);
        counter!(ENVELOPE_DECRYPT, 1);

        if ciphertext.len() < LENGTH_PREFIX_SIZE {
            return Err(Error::MalformedEnvelope(format!(
                "{} bytes is shorter than the length prefix",
                ciphertext.len()
            )));
        }

        let (prefix, rest) = ciphertext.split_at(LENGTH_PREFIX_SIZE);
        let mut len_bytes = [0_u8; LENGTH_PREFIX_SIZE];
        len_bytes.copy_from_slice(prefix);
        let declared = i32::from_be_bytes(len_bytes);

        if declared <= 0 || declared as usize > rest.len() {
            return Err(Error::MalformedEnvelope(format!(
                "invalid wrapped key length {} for {} remaining bytes",
                declared,
                rest.len()
            )));
        }

        let (encrypted_dek, payload) = rest.split_at(declared as usize);

        let dek = self
            .remote
            .decrypt(encrypted_dek, WRAP_ASSOCIATED_DATA)
            .map(Zeroizing::new)
            .map_err(unwrap_failed)?;
        let dek_aead = self.dek_aead(&dek).map_err(unwrap_failed)?;

        dek_aead.decrypt(payload, associated_data)
    }
}
