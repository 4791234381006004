use crate::envelope::{
    is_supported_dek_key_type, KmsEnvelopeAead, KmsEnvelopeAeadKey, KmsEnvelopeAeadKeyFormat,
    KMS_ENVELOPE_AEAD_TYPE_URL,
};
use crate::error::{Error, Result};
use crate::key::{
    validate_version, KeyFactory, KeyMaterialKind, KeyTypeManager, Primitive, PrimitiveKind,
};
use crate::kms::KmsClients;
use crate::Aead;
use log::debug;
use std::sync::Arc;

const VERSION: u32 = 0;
const PRIMITIVES: &[PrimitiveKind] = &[PrimitiveKind::Aead];

/// Creates envelope keys; no secret is generated
#[derive(Debug, Default)]
pub struct KmsEnvelopeAeadKeyFactory;

impl KeyFactory for KmsEnvelopeAeadKeyFactory {
    type Key = KmsEnvelopeAeadKey;
    type KeyFormat = KmsEnvelopeAeadKeyFormat;

    fn validate_key_format(&self, format: &KmsEnvelopeAeadKeyFormat) -> Result<()> {
        if let Some(template) = &format.dek_template {
            if !is_supported_dek_key_type(&template.type_url) {
                return Err(Error::InvalidKeyFormat(format!(
                    "unsupported DEK key type {}",
                    template.type_url
                )));
            }
        }
        if format.kek_uri.is_empty() {
            return Err(Error::InvalidKeyFormat("missing KEK URI".into()));
        }
        if format.dek_template.is_none() {
            return Err(Error::InvalidKeyFormat("missing DEK template".into()));
        }
        Ok(())
    }

    fn create_key(&self, format: &KmsEnvelopeAeadKeyFormat) -> Result<KmsEnvelopeAeadKey> {
        Ok(KmsEnvelopeAeadKey {
            version: VERSION,
            params: format.clone(),
        })
    }
}

/// Builds envelope primitives from envelope keys
///
/// Holds only the KMS client registry; the DEK template is read from each key.
#[derive(Debug, Clone)]
pub struct EnvelopeAeadFactory {
    kms_clients: Arc<KmsClients>,
}

impl EnvelopeAeadFactory {
    /// Creates a factory resolving KEKs through `kms_clients`
    pub fn new(kms_clients: Arc<KmsClients>) -> Self {
        Self { kms_clients }
    }

    /// Resolves the KEK and binds it to the key's DEK template
    pub fn get_primitive(&self, key: &KmsEnvelopeAeadKey) -> Result<Arc<dyn Aead>> {
        let dek_template = key.params.dek_template.clone().ok_or_else(|| {
            Error::UnsupportedKeyParameters("envelope key has no DEK template".into())
        })?;

        debug!("resolving KEK {}", key.params.kek_uri);
        let remote = self.kms_clients.get_aead(&key.params.kek_uri)?;

        Ok(Arc::new(KmsEnvelopeAead::new(dek_template, remote)?))
    }
}

/// Manager for KMS envelope AEAD keys
///
/// The KMS client registry is passed in explicitly; the manager never
/// consults process-wide state on its own.
#[derive(Debug)]
pub struct KmsEnvelopeAeadKeyManager {
    key_factory: KmsEnvelopeAeadKeyFactory,
    aead_factory: EnvelopeAeadFactory,
}

impl KmsEnvelopeAeadKeyManager {
    /// Creates a manager resolving KEKs through `kms_clients`
    pub fn new(kms_clients: Arc<KmsClients>) -> Self {
        Self {
            key_factory: KmsEnvelopeAeadKeyFactory,
            aead_factory: EnvelopeAeadFactory::new(kms_clients),
        }
    }
}

impl KeyTypeManager for KmsEnvelopeAeadKeyManager {
    type Key = KmsEnvelopeAeadKey;
    type Factory = KmsEnvelopeAeadKeyFactory;

    fn key_type(&self) -> &str {
        KMS_ENVELOPE_AEAD_TYPE_URL
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn key_material_kind(&self) -> KeyMaterialKind {
        KeyMaterialKind::Remote
    }

    fn supported_primitives(&self) -> &[PrimitiveKind] {
        PRIMITIVES
    }

    fn validate_key(&self, key: &KmsEnvelopeAeadKey) -> Result<()> {
        validate_version(key.version, VERSION)?;

        let template = key
            .params
            .dek_template
            .as_ref()
            .ok_or_else(|| Error::UnsupportedKeyParameters("missing DEK template".into()))?;
        if !is_supported_dek_key_type(&template.type_url) {
            return Err(Error::UnsupportedKeyParameters(format!(
                "unsupported DEK key type {}",
                template.type_url
            )));
        }

        if key.params.kek_uri.is_empty() {
            return Err(Error::UnsupportedKeyParameters("missing KEK URI".into()));
        }
        Ok(())
    }

    fn key_factory(&self) -> &KmsEnvelopeAeadKeyFactory {
        &self.key_factory
    }

    fn primitive(&self, key: &KmsEnvelopeAeadKey, kind: PrimitiveKind) -> Result<Primitive> {
        match kind {
            PrimitiveKind::Aead => Ok(Primitive::Aead(self.aead_factory.get_primitive(key)?)),
            other => Err(Error::UnsupportedPrimitive(format!("{:?}", other))),
        }
    }
}
