//! Integration tests for the PassVault crypto module.

use passvault::crypto::verifier::register_with_key;
use passvault::crypto::{register, verify, Argon2Params, EncryptedField, RecordCodec};
use passvault::errors::PassVaultError;
use passvault::vault::RecordId;

/// Cheapest parameters Argon2 validation accepts.
fn fast_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 8192,
        iterations: 1,
        parallelism: 1,
    }
}

// ---------------------------------------------------------------------------
// Key verifier
// ---------------------------------------------------------------------------

#[test]
fn verify_accepts_the_registered_secret_only() {
    let hash = register(b"correct horse", &fast_params()).unwrap();

    assert!(verify(b"correct horse", &hash));
    assert!(!verify(b"correct horsE", &hash));
    assert!(!verify(b"", &hash));
}

#[test]
fn verification_survives_json_roundtrip() {
    let hash = register(b"correct horse", &fast_params()).unwrap();
    let json = serde_json::to_string(&hash).unwrap();
    assert!(!json.contains("correct horse"));

    let back: passvault::crypto::VerificationHash = serde_json::from_str(&json).unwrap();
    assert_eq!(back, hash);
    assert!(verify(b"correct horse", &back));
}

// ---------------------------------------------------------------------------
// Record codec
// ---------------------------------------------------------------------------

fn codec_for(secret: &[u8]) -> RecordCodec {
    let (_, key) = register_with_key(secret, &fast_params()).unwrap();
    RecordCodec::new(&key).unwrap()
}

#[test]
fn codec_roundtrip() {
    let codec = codec_for(b"codec-secret");
    let id = RecordId::new();

    let blob = codec.encrypt_field(&id, "hunter2").unwrap();
    let plain = codec.decrypt_field(&id, &blob).unwrap();
    assert_eq!(plain.as_str(), "hunter2");
}

#[test]
fn codec_output_is_not_the_plaintext_and_is_randomized() {
    let codec = codec_for(b"codec-secret");
    let id = RecordId::new();

    let a = codec.encrypt_field(&id, "hunter2").unwrap();
    let b = codec.encrypt_field(&id, "hunter2").unwrap();

    assert_ne!(a.as_bytes(), b.as_bytes());
    assert!(!a
        .as_bytes()
        .windows(b"hunter2".len())
        .any(|w| w == b"hunter2"));
}

#[test]
fn decrypting_with_another_key_fails_loudly() {
    let id = RecordId::new();
    let blob = codec_for(b"first-secret").encrypt_field(&id, "hunter2").unwrap();

    let result = codec_for(b"second-secret").decrypt_field(&id, &blob);
    assert!(matches!(result, Err(PassVaultError::DecryptionFailed)));
}

#[test]
fn tampered_or_truncated_blob_fails() {
    let codec = codec_for(b"codec-secret");
    let id = RecordId::new();
    let blob = codec.encrypt_field(&id, "hunter2").unwrap();

    let mut tampered = blob.as_bytes().to_vec();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    assert!(codec
        .decrypt_field(&id, &EncryptedField::from_bytes(tampered))
        .is_err());

    let truncated = blob.as_bytes()[..10].to_vec();
    assert!(codec
        .decrypt_field(&id, &EncryptedField::from_bytes(truncated))
        .is_err());

    assert!(codec
        .decrypt_field(&id, &EncryptedField::from_bytes(Vec::new()))
        .is_err());
}
