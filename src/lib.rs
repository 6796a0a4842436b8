/*!
 * Key Blob Codec
 *
 * This crate implements the persistence format for keys protected by a
 * hardware-backed key store. A protected key is its encrypted key material,
 * the AEAD nonce and tag that go with it, and two authorization sets:
 *
 * - **enforced**: constraints the secure hardware guarantees
 * - **unenforced**: constraints supplied and checked only by software
 *
 * `KeyBlob` turns that into an opaque byte string callers can store outside
 * the trusted boundary and parses it back when the key is presented again.
 * Blobs are always written in the versioned layout; blobs issued under the
 * older unversioned layout are still accepted when read.
 *
 * The codec performs no cryptography. Nonce, tag and ciphertext are carried
 * as opaque bytes for the layer that decrypts the key.
 */

/// Key blob format and parsing
pub mod key_blob;

/// Authorization tags and sets
pub mod authorization;

/// Common error types
pub mod error;

/// Length-prefixed buffer primitives
pub mod utils;

/// Zeroizing containers for key material
pub mod secure_memory;

pub use authorization::{Algorithm, AuthorizationSet, KeyParamValue, KeyParameter, Tag, TagType};
pub use error::{CryptoError, CryptoResult, ErrorCode};
pub use key_blob::{
    BlobFormat, KeyBlob, KeyCharacteristics, KeymasterKeyBlob, BLOB_VERSION, NONCE_LENGTH,
    TAG_LENGTH,
};

/// The most commonly used types in one import.
///
/// # Example
///
/// ```
/// use keyblob::prelude::*;
///
/// fn main() -> Result<(), CryptoError> {
///     let mut enforced = AuthorizationSet::new();
///     enforced.push_algorithm(Algorithm::Aes)?;
///     enforced.push_key_size(128)?;
///
///     let mut blob = KeyBlob::new(enforced, AuthorizationSet::new());
///     blob.set_encrypted_key(vec![0xAAu8; 16], [0u8; NONCE_LENGTH], [0u8; TAG_LENGTH]);
///
///     let bytes = blob.serialize()?;
///     let parsed = KeyBlob::parse(&bytes)?;
///     assert_eq!(parsed.algorithm(), Some(Algorithm::Aes));
///     assert_eq!(parsed.key_size_bits(), Some(128));
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::authorization::{
        Algorithm, AuthorizationSet, BlockMode, Digest, KeyOrigin, KeyParamValue, KeyParameter,
        KeyPurpose, PaddingMode, Tag, TagType,
    };
    pub use crate::error::{CryptoError, CryptoResult, ErrorCode};
    pub use crate::key_blob::{
        BlobFormat, KeyBlob, KeyCharacteristics, KeymasterKeyBlob, BLOB_VERSION, NONCE_LENGTH,
        TAG_LENGTH,
    };
    pub use crate::secure_memory::SecureBytes;
}
