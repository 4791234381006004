//! Key management service clients
//!
//! A [`KmsClient`](crate::KmsClient) maps a key URI to an [`Aead`](crate::Aead)
//! backed by an external service. This module provides:
//!
//! - [`KmsClients`], the registry envelope keys resolve their KEK through
//! - [`StaticKmsClient`], a local client for testing and development
//!
//! Cloud clients are thin adapters living outside this crate; they only need
//! to implement the `KmsClient` trait.

mod static_kms;

pub use self::static_kms::StaticKmsClient;

use crate::error::{Error, Result};
use crate::{Aead, KmsClient};
use log::debug;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

static GLOBAL: OnceLock<Arc<KmsClients>> = OnceLock::new();

/// Registry of KMS clients keyed by URI prefix
///
/// Clients are added once and never removed. Lookup picks the supporting
/// client with the longest prefix.
#[derive(Default)]
pub struct KmsClients {
    write_lock: Mutex<()>,
    clients: RwLock<Arc<Vec<Arc<dyn KmsClient>>>>,
}

impl std::fmt::Debug for KmsClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsClients")
            .field("clients", &self.len())
            .finish()
    }
}

impl KmsClients {
    /// Creates an empty client registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide client registry
    pub fn global() -> Arc<KmsClients> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(KmsClients::new())))
    }

    fn snapshot(&self) -> Arc<Vec<Arc<dyn KmsClient>>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adds a client; a second client for the same prefix is rejected
    pub fn register(&self, client: Arc<dyn KmsClient>) -> Result<()> {
        let prefix = client.key_uri_prefix().to_string();

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.snapshot();
        if current.iter().any(|c| c.key_uri_prefix() == prefix) {
            return Err(Error::AlreadyRegisteredNoOverwrite(prefix));
        }

        let mut next = Vec::clone(&current);
        next.push(client);
        *self
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        debug!("registered KMS client for {}", prefix);
        Ok(())
    }

    /// Returns the most specific client supporting `key_uri`
    pub fn get(&self, key_uri: &str) -> Result<Arc<dyn KmsClient>> {
        self.snapshot()
            .iter()
            .filter(|c| c.does_support(key_uri))
            .max_by_key(|c| c.key_uri_prefix().len())
            .cloned()
            .ok_or_else(|| {
                debug!("no KMS client supports {}", key_uri);
                Error::UnsupportedUri(key_uri.to_string())
            })
    }

    /// Resolves the remote [`Aead`] bound to `key_uri`
    pub fn get_aead(&self, key_uri: &str) -> Result<Arc<dyn Aead>> {
        self.get(key_uri)?.get_aead(key_uri)
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns true if no client is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(prefix: &str) -> Result<Arc<dyn KmsClient>> {
        Ok(Arc::new(
            StaticKmsClient::new(prefix).with_key(format!("{}key", prefix), &[9_u8; 32])?,
        ))
    }

    #[test]
    fn test_register_rejects_duplicate_prefix() -> Result<()> {
        let clients = KmsClients::new();
        clients.register(client("static://")?)?;
        assert!(matches!(
            clients.register(client("static://")?),
            Err(Error::AlreadyRegisteredNoOverwrite(_))
        ));
        assert_eq!(clients.len(), 1);
        Ok(())
    }

    #[test]
    fn test_longest_prefix_wins() -> Result<()> {
        let clients = KmsClients::new();
        clients.register(client("static://")?)?;
        clients.register(client("static://region-a/")?)?;

        let found = clients.get("static://region-a/key")?;
        assert_eq!(found.key_uri_prefix(), "static://region-a/");

        let found = clients.get("static://key")?;
        assert_eq!(found.key_uri_prefix(), "static://");
        Ok(())
    }

    #[test]
    fn test_unsupported_uri() {
        let clients = KmsClients::new();
        assert!(clients.is_empty());
        assert!(matches!(
            clients.get("aws-kms://arn"),
            Err(Error::UnsupportedUri(_))
        ));
    }

    #[test]
    fn test_get_aead() -> Result<()> {
        let clients = KmsClients::new();
        clients.register(client("static://")?)?;

        let aead = clients.get_aead("static://key")?;
        let wrapped = aead.encrypt(b"dek", b"")?;
        assert_eq!(aead.decrypt(&wrapped, b"")?, b"dek");
        Ok(())
    }
}
