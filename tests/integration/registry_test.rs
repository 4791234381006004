// Registry behaviour observed through the public API

use crate::common::{init_logging, setup, FakeXorKmsClient, TEST_KEK_URI};
use cryptoagility::envelope::{create_key_template, KMS_ENVELOPE_AEAD_TYPE_URL};
use cryptoagility::error::{Error, ErrorCategory};
use cryptoagility::key::{AesGcmKeyManager, KeyManagerImpl, AES_GCM_TYPE_URL};
use cryptoagility::{
    config, register_key_manager, register_kms_client, templates, Cord, KeyData, KmsClients,
    PrimitiveKind, Registry,
};
use std::sync::Arc;

#[test]
fn test_builtin_key_types() {
    let fixture = setup();
    assert_eq!(
        fixture.registry.key_types(),
        vec![
            "type.googleapis.com/google.crypto.tink.AesGcmKey".to_string(),
            "type.googleapis.com/google.crypto.tink.ChaCha20Poly1305Key".to_string(),
            "type.googleapis.com/google.crypto.tink.KmsEnvelopeAeadKey".to_string(),
            "type.googleapis.com/google.crypto.tink.XChaCha20Poly1305Key".to_string(),
        ]
    );

    let envelope = fixture
        .registry
        .get_key_manager(KMS_ENVELOPE_AEAD_TYPE_URL)
        .expect("Envelope manager missing");
    assert_eq!(envelope.version(), 0);
    assert_eq!(envelope.supported_primitives(), &[PrimitiveKind::Aead]);
}

#[test]
fn test_cord_and_flat_primitives_share_keys() {
    let fixture = setup();
    let key_data = templates::aes256_gcm()
        .and_then(|template| fixture.registry.new_key_data(&template))
        .expect("Failed to create key");

    let flat = fixture
        .registry
        .get_aead(&key_data)
        .expect("Failed to get Aead");
    let cord = fixture
        .registry
        .get_primitive(&key_data, PrimitiveKind::CordAead)
        .and_then(|p| p.into_cord_aead())
        .expect("Failed to get CordAead");

    let message: Cord = vec![b"chunked ".to_vec(), b"large ".to_vec(), b"payload".to_vec()]
        .into_iter()
        .collect();
    let ciphertext = cord
        .encrypt(&message, &Cord::from(&b"ad"[..]))
        .expect("Failed to encrypt");
    assert_eq!(
        flat.decrypt(&ciphertext.to_vec(), b"ad")
            .expect("Failed to decrypt"),
        b"chunked large payload"
    );
}

#[test]
fn test_envelope_has_no_cord_primitive() {
    let fixture = setup();
    let template = templates::aes128_gcm()
        .and_then(|dek| create_key_template(TEST_KEK_URI, &dek))
        .expect("Failed to create template");
    let key_data = fixture
        .registry
        .new_key_data(&template)
        .expect("Failed to create key");

    assert!(matches!(
        fixture
            .registry
            .get_primitive(&key_data, PrimitiveKind::CordAead),
        Err(Error::UnsupportedPrimitive(_))
    ));
}

#[test]
fn test_key_data_survives_serialization() {
    let fixture = setup();
    let key_data = templates::xchacha20_poly1305()
        .and_then(|template| fixture.registry.new_key_data(&template))
        .expect("Failed to create key");
    let ciphertext = fixture
        .registry
        .get_aead(&key_data)
        .and_then(|aead| aead.encrypt(b"stored", b""))
        .expect("Failed to encrypt");

    let stored = serde_json::to_string(&key_data).expect("Failed to serialize");
    let loaded: KeyData = serde_json::from_str(&stored).expect("Failed to deserialize");

    let plaintext = fixture
        .registry
        .get_aead(&loaded)
        .and_then(|aead| aead.decrypt(&ciphertext, b""))
        .expect("Failed to decrypt");
    assert_eq!(plaintext, b"stored");
}

#[test]
fn test_truncated_key_data_is_malformed() {
    let fixture = setup();
    let mut key_data = templates::aes128_gcm()
        .and_then(|template| fixture.registry.new_key_data(&template))
        .expect("Failed to create key");
    let len = key_data.value.len();
    key_data.value.truncate(len - 1);

    let err = fixture
        .registry
        .get_aead(&key_data)
        .expect_err("Truncated key should fail");
    assert!(matches!(err, Error::MalformedKeyEncoding(_)));
    assert_eq!(err.category(), ErrorCategory::Integrity);
}

#[test]
fn test_explicit_context_is_isolated() {
    init_logging();
    let registry = Registry::new();
    assert!(!registry.is_registered(AES_GCM_TYPE_URL));

    // Resolving through a client registry that lacks the KEK fails cleanly
    config::AeadConfig::new()
        .register(&registry, Arc::new(KmsClients::new()))
        .expect("Failed to register key managers");
    let template = templates::aes128_gcm()
        .and_then(|dek| create_key_template(TEST_KEK_URI, &dek))
        .expect("Failed to create template");
    let key_data = registry
        .new_key_data(&template)
        .expect("Failed to create key");
    assert!(matches!(
        registry.get_aead(&key_data),
        Err(Error::UnsupportedUri(_))
    ));
}

#[test]
fn test_global_registration_helpers() {
    init_logging();
    config::register().expect("Failed to register globally");

    // An equivalent manager replaces the global entry only with overwrite
    let manager = Arc::new(KeyManagerImpl::new(AesGcmKeyManager::new()));
    register_key_manager(manager.clone(), true).expect("Overwrite should succeed");
    assert!(matches!(
        register_key_manager(manager, false),
        Err(Error::AlreadyRegisteredNoOverwrite(_))
    ));

    register_kms_client(Arc::new(FakeXorKmsClient::new()))
        .expect("Failed to register KMS client");
    assert!(matches!(
        register_kms_client(Arc::new(FakeXorKmsClient::new())),
        Err(Error::AlreadyRegisteredNoOverwrite(_))
    ));

    let template = templates::aes128_gcm()
        .and_then(|dek| create_key_template(TEST_KEK_URI, &dek))
        .expect("Failed to create template");
    let registry = Registry::global();
    let aead = registry
        .new_key_data(&template)
        .and_then(|key_data| registry.get_aead(&key_data))
        .expect("Failed to get global envelope primitive");
    let ciphertext = aead.encrypt(b"global", b"").expect("Failed to encrypt");
    assert_eq!(
        aead.decrypt(&ciphertext, b"").expect("Failed to decrypt"),
        b"global"
    );
}
