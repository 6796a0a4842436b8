//! Property tests for the key blob format
//!
//! These exercise the codec through the public API only: versioned blobs
//! written by `KeyBlob::serialize`, and legacy blobs assembled by hand the way
//! older key stores wrote them.

use proptest::prelude::*;

use keyblob::authorization::{Algorithm, AuthorizationSet, Tag};
use keyblob::utils::ByteWriter;
use keyblob::{BlobFormat, ErrorCode, KeyBlob, BLOB_VERSION, NONCE_LENGTH, TAG_LENGTH};

fn authorization_set(
    algorithm: Option<Algorithm>,
    key_size: Option<u32>,
    app_id: &[u8],
) -> AuthorizationSet {
    let mut set = AuthorizationSet::new();
    if let Some(algorithm) = algorithm {
        set.push_algorithm(algorithm).unwrap();
    }
    if let Some(bits) = key_size {
        set.push_key_size(bits).unwrap();
    }
    if !app_id.is_empty() {
        set.push_blob(Tag::APPLICATION_ID, app_id).unwrap();
    }
    set
}

fn serialize_set(set: &AuthorizationSet) -> Vec<u8> {
    let mut out = vec![0u8; set.serialized_size()];
    set.serialize(&mut ByteWriter::new(&mut out)).unwrap();
    out
}

fn algorithm_strategy() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::Rsa),
        Just(Algorithm::Ec),
        Just(Algorithm::Aes),
        Just(Algorithm::Hmac),
    ]
}

proptest! {
    #[test]
    fn versioned_round_trip(
        material in proptest::collection::vec(any::<u8>(), 0..512),
        nonce in any::<[u8; NONCE_LENGTH]>(),
        tag in any::<[u8; TAG_LENGTH]>(),
        algorithm in algorithm_strategy(),
        key_size in 1u32..8192,
        app_id in proptest::collection::vec(any::<u8>(), 0..32),
        in_enforced in any::<bool>(),
    ) {
        let characteristics = authorization_set(Some(algorithm), Some(key_size), &[]);
        let extra = authorization_set(None, None, &app_id);
        let (enforced, unenforced) = if in_enforced {
            (characteristics, extra)
        } else {
            (extra, characteristics)
        };

        let mut blob = KeyBlob::new(enforced.clone(), unenforced.clone());
        blob.set_encrypted_key(material.clone(), nonce, tag);
        let bytes = blob.serialize().unwrap();

        prop_assert_eq!(bytes[0], BLOB_VERSION);
        prop_assert_eq!(bytes.len(), blob.serialized_size());

        let parsed = KeyBlob::parse(&bytes).unwrap();
        prop_assert_eq!(parsed.format(), BlobFormat::Versioned);
        prop_assert_eq!(parsed.nonce(), &nonce[..]);
        prop_assert_eq!(parsed.tag(), &tag[..]);
        prop_assert_eq!(parsed.encrypted_key_material(), &material[..]);
        prop_assert_eq!(parsed.enforced(), &enforced);
        prop_assert_eq!(parsed.unenforced(), &unenforced);
        prop_assert_eq!(parsed.algorithm(), Some(algorithm));
        prop_assert_eq!(parsed.key_size_bits(), Some(key_size));
    }

    #[test]
    fn legacy_blobs_parse_as_legacy(
        material in proptest::collection::vec(any::<u8>(), 0..256),
        nonce_seed in any::<[u8; NONCE_LENGTH]>(),
        tag in any::<[u8; TAG_LENGTH]>(),
        first_byte in 1u8..=255,
    ) {
        let mut nonce = nonce_seed;
        nonce[0] = first_byte;
        let enforced = authorization_set(Some(Algorithm::Aes), Some(256), &[]);
        let unenforced = AuthorizationSet::new();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(&(material.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&material);
        bytes.extend_from_slice(&tag);
        bytes.extend_from_slice(&serialize_set(&enforced));
        bytes.extend_from_slice(&serialize_set(&unenforced));

        let parsed = KeyBlob::parse(&bytes).unwrap();
        prop_assert_eq!(parsed.format(), BlobFormat::Legacy);
        prop_assert_eq!(parsed.nonce(), &nonce[..]);
        prop_assert_eq!(parsed.tag(), &tag[..]);
        prop_assert_eq!(parsed.encrypted_key_material(), &material[..]);
        prop_assert_eq!(parsed.algorithm(), Some(Algorithm::Aes));
    }

    #[test]
    fn truncated_blobs_are_rejected(
        material in proptest::collection::vec(0x80u8..=0xFF, 4..64),
        cut in any::<prop::sample::Index>(),
    ) {
        let mut blob = KeyBlob::new(
            authorization_set(Some(Algorithm::Aes), Some(128), b"app"),
            AuthorizationSet::new(),
        );
        blob.set_encrypted_key(material, [0x5A; NONCE_LENGTH], [0x3C; TAG_LENGTH]);
        let bytes = blob.serialize().unwrap();

        let len = cut.index(bytes.len());
        let parsed = KeyBlob::from_bytes(&bytes[..len]);
        prop_assert_eq!(parsed.error(), ErrorCode::InvalidKeyBlob);
    }
}

#[test]
fn test_garbage_never_panics() {
    let inputs: [&[u8]; 5] = [
        &[],
        &[0],
        &[0, 12, 0, 0, 0],
        &[0xFF; 64],
        &[0, 12, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 0xFF, 0xFF, 0xFF, 0xFF],
    ];
    for input in inputs {
        let parsed = KeyBlob::from_bytes(input);
        assert_eq!(parsed.error(), ErrorCode::InvalidKeyBlob);
    }
}
