//! Registration of the built-in key managers
//!
//! Applications call [`register`] once at start-up, or build an
//! [`AeadConfig`] to register into a registry of their own.

use crate::envelope::KmsEnvelopeAeadKeyManager;
use crate::error::Result;
use crate::key::{
    AesGcmKeyManager, ChaCha20Poly1305KeyManager, KeyManagerImpl, KeyTypeManager,
    XChaCha20Poly1305KeyManager,
};
use crate::kms::KmsClients;
use crate::registry::Registry;
use log::debug;
use std::sync::Arc;

/// Which built-in AEAD key managers to register, and how
#[derive(Debug, Clone)]
pub struct AeadConfig {
    /// Whether the registered types may create new keys
    pub new_key_allowed: bool,

    /// Whether an equivalent, already registered manager may be replaced
    pub allow_overwrite: bool,

    /// Whether to register the KMS envelope key manager
    pub envelope: bool,
}

impl Default for AeadConfig {
    fn default() -> Self {
        Self {
            new_key_allowed: true,
            allow_overwrite: false,
            envelope: true,
        }
    }
}

impl AeadConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether new keys may be created
    ///
    /// # Example
    /// ```
    /// use cryptoagility::config::AeadConfig;
    ///
    /// let config = AeadConfig::new().with_new_key_allowed(false);
    /// assert!(!config.new_key_allowed);
    /// ```
    pub fn with_new_key_allowed(mut self, allowed: bool) -> Self {
        self.new_key_allowed = allowed;
        self
    }

    /// Sets whether equivalent managers may be replaced
    pub fn with_allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    /// Sets whether the KMS envelope manager is registered
    pub fn with_envelope(mut self, enabled: bool) -> Self {
        self.envelope = enabled;
        self
    }

    fn register_one<M: KeyTypeManager>(&self, registry: &Registry, manager: M) -> Result<()> {
        registry.register_key_manager_with(
            Arc::new(KeyManagerImpl::new(manager)),
            self.allow_overwrite,
            self.new_key_allowed,
        )
    }

    /// Registers the built-in managers into `registry`
    ///
    /// Envelope keys resolve their KEK through `kms_clients`.
    pub fn register(&self, registry: &Registry, kms_clients: Arc<KmsClients>) -> Result<()> {
        self.register_one(registry, AesGcmKeyManager::new())?;
        self.register_one(registry, ChaCha20Poly1305KeyManager::new())?;
        self.register_one(registry, XChaCha20Poly1305KeyManager::new())?;

        if self.envelope {
            self.register_one(registry, KmsEnvelopeAeadKeyManager::new(kms_clients))?;
        }

        debug!("registered AEAD key managers: {:?}", registry.key_types());
        Ok(())
    }
}

/// Registers the built-in managers into the global registry
///
/// Envelope keys resolve through [`KmsClients::global`]. Calling this more
/// than once is harmless.
pub fn register() -> Result<()> {
    AeadConfig::new()
        .with_allow_overwrite(true)
        .register(Registry::global(), KmsClients::global())
}
