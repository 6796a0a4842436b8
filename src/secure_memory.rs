//! Secure Memory Handling Utilities
//!
//! Owned containers for key material that are zeroed when dropped or cleared.
//! Every buffer a `KeyBlob` owns (nonce, tag and encrypted key material) is
//! held in a `SecureBytes`, so replacing or destroying a blob never leaves the
//! previous bytes behind in freed memory.

use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// A byte container for sensitive data that is zeroed when dropped.
///
/// # Security Properties
///
/// 1. Automatically zeroes memory when dropped
/// 2. `Debug` output never contains the bytes, only their length
/// 3. `clear` zeroes the contents before truncating
/// 4. Equality is evaluated in constant time
///
/// # Example
///
/// ```
/// use keyblob::secure_memory::SecureBytes;
///
/// let ciphertext = SecureBytes::new(&[0xAA; 16]);
/// assert_eq!(ciphertext.len(), 16);
/// // When `ciphertext` goes out of scope, memory is zeroed
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    bytes: Vec<u8>,
}

impl SecureBytes {
    /// Create a new SecureBytes holding a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }

    /// Create a SecureBytes holding a copy of `data`, reporting allocation
    /// failure as an error instead of aborting the process.
    ///
    /// Blob lengths come from untrusted input, so a bogus length field must
    /// not be able to take the process down.
    pub fn try_from_slice(data: &[u8]) -> CryptoResult<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(data.len()).map_err(|e| {
            CryptoError::memory_error(
                "allocate_secure_bytes",
                &format!("{} bytes: {}", data.len(), e),
            )
        })?;
        bytes.extend_from_slice(data);
        Ok(Self { bytes })
    }

    /// Get a reference to the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the container and return the contained bytes
    ///
    /// # Security Considerations
    ///
    /// After calling this method it becomes the caller's responsibility to
    /// zeroize the returned vector.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Clear the buffer, zeroing all data first
    pub fn clear(&mut self) {
        self.bytes.zeroize();
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.as_slice().ct_eq(other.bytes.as_slice()).into()
    }
}

impl Eq for SecureBytes {}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
