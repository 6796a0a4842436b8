#![no_main]

use arbitrary::Arbitrary;
use keyblob::authorization::{Algorithm, AuthorizationSet, Tag};
use keyblob::{KeyBlob, NONCE_LENGTH, TAG_LENGTH};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct KeyBlobFuzzInput {
    material: Vec<u8>,
    nonce: [u8; NONCE_LENGTH],
    tag: [u8; TAG_LENGTH],
    key_size: u32,
    application_id: Vec<u8>,
    truncate_to: Option<usize>,
}

fuzz_target!(|input: KeyBlobFuzzInput| {
    let mut enforced = AuthorizationSet::new();
    if enforced.push_algorithm(Algorithm::Aes).is_err()
        || enforced.push_key_size(input.key_size).is_err()
    {
        return;
    }
    let mut unenforced = AuthorizationSet::new();
    if unenforced
        .push_blob(Tag::APPLICATION_ID, &input.application_id)
        .is_err()
    {
        return;
    }

    let mut blob = KeyBlob::new(enforced, unenforced);
    blob.set_encrypted_key(input.material.clone(), input.nonce, input.tag);
    let bytes = match blob.serialize() {
        Ok(bytes) => bytes,
        Err(_) => return,
    };
    assert_eq!(bytes.len(), blob.serialized_size());

    let parsed = KeyBlob::parse(&bytes).expect("serialized blob must parse");
    assert_eq!(parsed.encrypted_key_material(), &input.material[..]);

    // Truncated copies must not panic
    if let Some(len) = input.truncate_to.filter(|len| *len < bytes.len()) {
        let _ = KeyBlob::from_bytes(&bytes[..len]);
    }
});
