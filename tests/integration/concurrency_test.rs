// Tests to verify concurrent use of registries and envelope primitives

use crate::common::{setup, TEST_KEK_URI};
use cryptoagility::envelope::create_key_template;
use cryptoagility::kms::{KmsClients, StaticKmsClient};
use cryptoagility::templates;
use std::sync::Arc;
use std::thread;

const NUM_THREADS: usize = 8;
const OPERATIONS_PER_THREAD: usize = 50;

#[test]
fn test_shared_envelope_primitive() {
    let fixture = setup();
    let template = templates::aes128_gcm()
        .and_then(|dek| create_key_template(TEST_KEK_URI, &dek))
        .expect("Failed to create template");
    let key_data = fixture
        .registry
        .new_key_data(&template)
        .expect("Failed to create key");
    let aead = fixture
        .registry
        .get_aead(&key_data)
        .expect("Failed to get primitive");

    thread::scope(|s| {
        for i in 0..NUM_THREADS {
            let aead = aead.clone();
            s.spawn(move || {
                for j in 0..OPERATIONS_PER_THREAD {
                    let data = format!("thread_{}_operation_{}", i, j);
                    let ciphertext = aead
                        .encrypt(data.as_bytes(), b"ad")
                        .expect("Failed to encrypt");
                    let plaintext = aead.decrypt(&ciphertext, b"ad").expect("Failed to decrypt");
                    assert_eq!(plaintext, data.as_bytes());
                }
            });
        }
    });
}

#[test]
fn test_concurrent_kms_client_registration() {
    let clients = Arc::new(KmsClients::new());

    thread::scope(|s| {
        for i in 0..NUM_THREADS {
            let writer = Arc::clone(&clients);
            s.spawn(move || {
                let prefix = format!("static://{}/", i);
                let client = StaticKmsClient::new(prefix.clone())
                    .with_key(format!("{}kek", prefix), &[i as u8; 32])
                    .expect("Failed to create client");
                writer
                    .register(Arc::new(client))
                    .expect("Failed to register client");
            });
            s.spawn(|| {
                // Lookups race with registration; a hit is always a complete client
                if let Ok(client) = clients.get("static://0/kek") {
                    assert_eq!(client.key_uri_prefix(), "static://0/");
                }
            });
        }
    });

    assert_eq!(clients.len(), NUM_THREADS);
    for i in 0..NUM_THREADS {
        let uri = format!("static://{}/kek", i);
        let aead = clients.get_aead(&uri).expect("Failed to resolve KEK");
        let wrapped = aead.encrypt(b"dek", b"").expect("Failed to wrap");
        assert_eq!(aead.decrypt(&wrapped, b"").expect("Failed to unwrap"), b"dek");
    }
}
