// End-to-end tests of envelope keys resolved through the registry

use crate::common::{setup, XorAead, TEST_KEK_URI};
use cryptoagility::envelope::{create_key_template, KmsEnvelopeAeadKey};
use cryptoagility::error::Error;
use cryptoagility::key::{AesGcmKey, AesGcmKeyManager, KeyTypeManager};
use cryptoagility::{templates, KeyMaterialKind, KeyTemplate, OutputPrefixType};
use std::collections::HashSet;
use zeroize::Zeroizing;

const LENGTH_PREFIX_SIZE: usize = 4;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

fn wrapped_len(ciphertext: &[u8]) -> usize {
    let mut prefix = [0_u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&ciphertext[..LENGTH_PREFIX_SIZE]);
    u32::from_be_bytes(prefix) as usize
}

#[test]
fn test_xor_kms_scenario() {
    let fixture = setup();

    let template = templates::aes128_gcm()
        .and_then(|dek| create_key_template(TEST_KEK_URI, &dek))
        .expect("Failed to create template");
    let key_data = fixture
        .registry
        .new_key_data(&template)
        .expect("Failed to create key");
    assert_eq!(key_data.key_material_kind, KeyMaterialKind::Remote);

    let aead = fixture
        .registry
        .get_aead(&key_data)
        .expect("Failed to get primitive");
    let ciphertext = aead.encrypt(b"hello", b"ctx").expect("Failed to encrypt");

    // The XOR "KMS" preserves length, so the prefix is the serialized DEK length
    let serialized_dek = serde_json::to_vec(&AesGcmKey {
        version: 0,
        key_value: Zeroizing::new(vec![0_u8; 16]),
    })
    .expect("Failed to serialize key");
    let dek_len = wrapped_len(&ciphertext);
    assert_eq!(dek_len, serialized_dek.len());
    assert_eq!(
        ciphertext.len(),
        LENGTH_PREFIX_SIZE + dek_len + NONCE_SIZE + 5 + TAG_SIZE
    );

    // The wrapped bytes are a fresh AES-128-GCM key
    let encrypted_dek = &ciphertext[LENGTH_PREFIX_SIZE..LENGTH_PREFIX_SIZE + dek_len];
    let dek = AesGcmKeyManager::new()
        .parse_key(&XorAead::new().apply(encrypted_dek))
        .expect("Failed to parse unwrapped key");
    assert_eq!(dek.version, 0);
    assert_eq!(dek.key_value.len(), 16);

    assert_eq!(
        aead.decrypt(&ciphertext, b"ctx").expect("Failed to decrypt"),
        b"hello"
    );
    assert!(matches!(
        aead.decrypt(&ciphertext, b"other"),
        Err(Error::AuthenticationFailed)
    ));
    assert!(fixture.kms.lookups() > 0);
}

#[test]
fn test_round_trip_every_dek_template() {
    let fixture = setup();

    for dek_template in [
        templates::aes128_gcm,
        templates::aes256_gcm,
        templates::chacha20_poly1305,
        templates::xchacha20_poly1305,
    ] {
        let template = dek_template()
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

        for len in (0..=64).step_by(8) {
            let plaintext: Vec<u8> = (0..len as u8).collect();
            let ad: Vec<u8> = (0..(len / 3) as u8).rev().collect();
            let ciphertext = aead.encrypt(&plaintext, &ad).expect("Failed to encrypt");
            assert_eq!(
                aead.decrypt(&ciphertext, &ad).expect("Failed to decrypt"),
                plaintext
            );
        }
    }
}

#[test]
fn test_every_bit_flip_is_rejected() {
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

    let mut ciphertext = aead.encrypt(b"hello", b"ctx").expect("Failed to encrypt");

    // Everything after the length prefix: wrapped DEK, nonce, body and tag
    for i in LENGTH_PREFIX_SIZE..ciphertext.len() {
        for bit in 0..8 {
            ciphertext[i] ^= 1 << bit;
            match aead.decrypt(&ciphertext, b"ctx") {
                Err(Error::AuthenticationFailed) | Err(Error::EnvelopeDekUnwrapFailed(_)) => {}
                other => panic!("byte {} bit {}: unexpected result {:?}", i, bit, other),
            }
            ciphertext[i] ^= 1 << bit;
        }
    }

    assert_eq!(
        aead.decrypt(&ciphertext, b"ctx").expect("Failed to decrypt"),
        b"hello"
    );
}

#[test]
fn test_fresh_dek_per_encryption() {
    let fixture = setup();
    let template = templates::aes256_gcm()
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

    let mut seen = HashSet::new();
    for _ in 0..100 {
        let ciphertext = aead.encrypt(b"same message", b"").expect("Failed to encrypt");
        let len = wrapped_len(&ciphertext);
        let encrypted_dek = ciphertext[LENGTH_PREFIX_SIZE..LENGTH_PREFIX_SIZE + len].to_vec();
        assert!(seen.insert(encrypted_dek), "wrapped DEK repeated");
    }
}

#[test]
fn test_malformed_length_prefix() {
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

    let ciphertext = aead.encrypt(b"hello", b"").expect("Failed to encrypt");
    let remaining = (ciphertext.len() - LENGTH_PREFIX_SIZE) as u32;

    let mut too_long = ciphertext.clone();
    too_long[..LENGTH_PREFIX_SIZE].copy_from_slice(&(remaining + 1).to_be_bytes());

    for bad in [&ciphertext[..3], &ciphertext[..0], &too_long[..]] {
        assert!(matches!(
            aead.decrypt(bad, b""),
            Err(Error::MalformedEnvelope(_))
        ));
    }
}

#[test]
fn test_ciphertexts_decrypt_across_registries() {
    let sender = setup();
    let receiver = setup();

    let template = templates::chacha20_poly1305()
        .and_then(|dek| create_key_template(TEST_KEK_URI, &dek))
        .expect("Failed to create template");
    let key_data = sender
        .registry
        .new_key_data(&template)
        .expect("Failed to create key");

    let ciphertext = sender
        .registry
        .get_aead(&key_data)
        .and_then(|aead| aead.encrypt(b"portable", b"ad"))
        .expect("Failed to encrypt");
    let plaintext = receiver
        .registry
        .get_aead(&key_data)
        .and_then(|aead| aead.decrypt(&ciphertext, b"ad"))
        .expect("Failed to decrypt");
    assert_eq!(plaintext, b"portable");
}

#[test]
fn test_non_aead_dek_rejected_before_kms() {
    let fixture = setup();
    let mac = KeyTemplate::new(
        "type.googleapis.com/google.crypto.tink.HmacKey",
        Vec::new(),
        OutputPrefixType::Tink,
    );

    assert!(matches!(
        create_key_template(TEST_KEK_URI, &mac),
        Err(Error::UnsupportedDekType(_))
    ));
    assert_eq!(fixture.kms.lookups(), 0);
}

#[test]
fn test_unknown_kek_uri() {
    let fixture = setup();
    let template = templates::aes128_gcm()
        .and_then(|dek| create_key_template("other-kms://key1", &dek))
        .expect("Failed to create template");
    let key_data = fixture
        .registry
        .new_key_data(&template)
        .expect("Failed to create key");

    let key: KmsEnvelopeAeadKey =
        serde_json::from_slice(&key_data.value).expect("Failed to decode key");
    assert_eq!(key.params.kek_uri, "other-kms://key1");

    assert!(matches!(
        fixture.registry.get_aead(&key_data),
        Err(Error::UnsupportedUri(_))
    ));
}
