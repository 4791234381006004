// Common fixtures shared across integration tests

use cryptoagility::config::AeadConfig;
use cryptoagility::error::{Error, Result};
use cryptoagility::kms::KmsClients;
use cryptoagility::registry::Registry;
use cryptoagility::{Aead, KmsClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Constants for tests
pub const TEST_KMS_PREFIX: &str = "test-kms://";
pub const TEST_KEK_URI: &str = "test-kms://key1";
pub const XOR_PAD: &str = "5a3c96e1f00fa5c3";

/// Installs a test logger; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// "Encrypts" by XOR with a repeating pad; the output length equals the input
#[derive(Debug)]
pub struct XorAead {
    pad: Vec<u8>,
}

impl XorAead {
    pub fn new() -> Self {
        Self {
            pad: hex::decode(XOR_PAD).expect("Invalid hex pad"),
        }
    }

    pub fn apply(&self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.pad.iter().cycle())
            .map(|(d, p)| d ^ p)
            .collect()
    }
}

impl Aead for XorAead {
    fn encrypt(&self, plaintext: &[u8], _associated_data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.apply(plaintext))
    }

    fn decrypt(&self, ciphertext: &[u8], _associated_data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.apply(ciphertext))
    }
}

/// Fake KMS client serving `test-kms://` URIs with [`XorAead`]
///
/// Counts how often it was asked for a remote key.
#[derive(Debug, Default)]
pub struct FakeXorKmsClient {
    lookups: AtomicUsize,
}

impl FakeXorKmsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl KmsClient for FakeXorKmsClient {
    fn key_uri_prefix(&self) -> &str {
        TEST_KMS_PREFIX
    }

    fn get_aead(&self, key_uri: &str) -> Result<Arc<dyn Aead>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.does_support(key_uri) {
            return Err(Error::UnsupportedUri(key_uri.to_string()));
        }
        Ok(Arc::new(XorAead::new()))
    }
}

/// A registry with the built-in managers, resolving KEKs through the fake client
pub struct Fixture {
    pub registry: Registry,
    pub kms: Arc<FakeXorKmsClient>,
}

pub fn setup() -> Fixture {
    init_logging();

    let kms = Arc::new(FakeXorKmsClient::new());
    let clients = Arc::new(KmsClients::new());
    clients
        .register(kms.clone())
        .expect("Failed to register KMS client");

    let registry = Registry::new();
    AeadConfig::new()
        .register(&registry, clients)
        .expect("Failed to register key managers");

    Fixture { registry, kms }
}
