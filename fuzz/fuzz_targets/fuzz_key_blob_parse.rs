#![no_main]

use keyblob::{ErrorCode, KeyBlob};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must never panic, and anything accepted must re-serialize
    let blob = KeyBlob::from_bytes(data);
    if blob.error() == ErrorCode::Ok {
        let bytes = blob.serialize().expect("parsed blob must serialize");
        let reparsed = KeyBlob::from_bytes(&bytes);
        assert_eq!(reparsed.error(), ErrorCode::Ok);
        assert_eq!(reparsed.encrypted_key_material(), blob.encrypted_key_material());
        assert_eq!(reparsed.nonce(), blob.nonce());
        assert_eq!(reparsed.tag(), blob.tag());
    }
});
