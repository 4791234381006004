use crate::crypto::AesGcm;
use crate::error::{Error, Result};
use crate::{Aead, KmsClient};
use std::collections::HashMap;
use std::sync::Arc;

const MASTER_KEY_SIZE: usize = 32;

/// A static key management client for testing
///
/// Each key URI maps to a local AES-256-GCM master key. This is useful for
/// tests and development but should not be used in production.
pub struct StaticKmsClient {
    prefix: String,
    keys: HashMap<String, Arc<AesGcm>>,
}

impl StaticKmsClient {
    /// Creates a client serving URIs that start with `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            keys: HashMap::new(),
        }
    }

    /// Binds a 32-byte master key to `key_uri`
    pub fn with_key(mut self, key_uri: impl Into<String>, master_key: &[u8]) -> Result<Self> {
        let key_uri = key_uri.into();
        if !key_uri.starts_with(&self.prefix) {
            return Err(Error::InvalidArgument(format!(
                "key URI {} does not start with {}",
                key_uri, self.prefix
            )));
        }
        if master_key.len() != MASTER_KEY_SIZE {
            return Err(Error::InvalidArgument(format!(
                "master key must be {} bytes",
                MASTER_KEY_SIZE
            )));
        }

        self.keys.insert(key_uri, Arc::new(AesGcm::new(master_key)?));
        Ok(self)
    }
}

impl std::fmt::Debug for StaticKmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut uris: Vec<&String> = self.keys.keys().collect();
        uris.sort();
        f.debug_struct("StaticKmsClient")
            .field("prefix", &self.prefix)
            .field("key_uris", &uris)
            .finish()
    }
}

impl KmsClient for StaticKmsClient {
    fn key_uri_prefix(&self) -> &str {
        &self.prefix
    }

    fn get_aead(&self, key_uri: &str) -> Result<Arc<dyn Aead>> {
        if !self.does_support(key_uri) {
            return Err(Error::UnsupportedUri(key_uri.to_string()));
        }

        match self.keys.get(key_uri) {
            Some(aead) => Ok(Arc::clone(aead) as Arc<dyn Aead>),
            None => Err(Error::UnsupportedUri(key_uri.to_string())),
        }
    }
}
