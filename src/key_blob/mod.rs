//! Key Blob Serialization
//!
//! Versioned key blob format with fallback parsing of legacy unversioned
//! blobs.

mod key_blob;


pub use key_blob::{
    BlobFormat, KeyBlob, KeyCharacteristics, KeymasterKeyBlob, BLOB_VERSION, NONCE_LENGTH,
    TAG_LENGTH,
};
