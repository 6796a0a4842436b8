/*!
 * Key blob codec
 *
 * A key blob is the opaque byte string handed to callers in place of a key.
 * It carries the encrypted key material, the AEAD nonce and tag needed to
 * decrypt it, and the enforced and unenforced authorization sets.
 *
 * Versioned layout (version 0), the only one ever written:
 *
 * ```text
 * [u8 version = 0]
 * [u32 len][nonce]        len == NONCE_LENGTH
 * [u32 len][ciphertext]
 * [u32 len][tag]          len == TAG_LENGTH
 * [enforced authorization set]
 * [unenforced authorization set]
 * ```
 *
 * Legacy layout, still accepted on input:
 *
 * ```text
 * [nonce, NONCE_LENGTH bytes]
 * [u32 len][ciphertext]
 * [tag, TAG_LENGTH bytes]
 * [enforced authorization set]
 * [unenforced authorization set]
 * ```
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::authorization::{Algorithm, AuthorizationSet, Tag};
use crate::error::{CryptoError, CryptoResult, ErrorCode};
use crate::secure_memory::SecureBytes;
use crate::utils::{ByteReader, ByteWriter, ReadError, LENGTH_PREFIX_SIZE};

/// Version byte written at the start of every blob
pub const BLOB_VERSION: u8 = 0;

/// Length of the AEAD nonce carried in a blob
pub const NONCE_LENGTH: usize = 12;

/// Length of the AEAD authentication tag carried in a blob
pub const TAG_LENGTH: usize = 16;

/// Layout a blob was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobFormat {
    /// Version byte plus explicit nonce and tag lengths
    Versioned,
    /// Unversioned layout issued before the version byte existed
    Legacy,
}

/// Serialized key blob as handed across the HAL boundary
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeymasterKeyBlob {
    pub key_material: Vec<u8>,
}

impl KeymasterKeyBlob {
    pub fn new(key_material: Vec<u8>) -> Self {
        Self { key_material }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key_material
    }
}

impl From<Vec<u8>> for KeymasterKeyBlob {
    fn from(key_material: Vec<u8>) -> Self {
        Self::new(key_material)
    }
}

impl fmt::Debug for KeymasterKeyBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeymasterKeyBlob")
            .field("key_material_size", &self.key_material.len())
            .finish()
    }
}

/// Serializable summary of a parsed key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCharacteristics {
    /// Known algorithm, if the stored value maps to one
    pub algorithm: Option<Algorithm>,
    /// Raw ALGORITHM value as stored in the blob
    pub algorithm_value: Option<u32>,
    pub key_size_bits: Option<u32>,
    pub format: BlobFormat,
    pub enforced: AuthorizationSet,
    pub unenforced: AuthorizationSet,
}

impl KeyCharacteristics {
    pub fn to_json(&self) -> CryptoResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fields read by one parse attempt, committed to the blob only on success
struct ParsedBlob {
    nonce: SecureBytes,
    encrypted_key_material: SecureBytes,
    tag: SecureBytes,
    enforced: AuthorizationSet,
    unenforced: AuthorizationSet,
}

fn parse_versioned(reader: &mut ByteReader<'_>) -> Result<ParsedBlob, ReadError> {
    if reader.read_u8()? != BLOB_VERSION {
        return Err(ReadError::Malformed("unknown blob version"));
    }
    let nonce = reader.copy_size_and_data()?;
    if nonce.len() != NONCE_LENGTH {
        return Err(ReadError::Malformed("nonce length mismatch"));
    }
    let encrypted_key_material = reader.copy_size_and_data()?;
    let tag = reader.copy_size_and_data()?;
    if tag.len() != TAG_LENGTH {
        return Err(ReadError::Malformed("tag length mismatch"));
    }
    let enforced = AuthorizationSet::deserialize(reader)?;
    let unenforced = AuthorizationSet::deserialize(reader)?;
    Ok(ParsedBlob {
        nonce,
        encrypted_key_material,
        tag,
        enforced,
        unenforced,
    })
}

fn parse_legacy(reader: &mut ByteReader<'_>) -> Result<ParsedBlob, ReadError> {
    let nonce = reader.copy_from_buf(NONCE_LENGTH)?;
    let encrypted_key_material = reader.copy_size_and_data()?;
    let tag = reader.copy_from_buf(TAG_LENGTH)?;
    let enforced = AuthorizationSet::deserialize(reader)?;
    let unenforced = AuthorizationSet::deserialize(reader)?;
    Ok(ParsedBlob {
        nonce,
        encrypted_key_material,
        tag,
        enforced,
        unenforced,
    })
}

/// A protected key and its authorizations
#[derive(Clone)]
pub struct KeyBlob {
    nonce: SecureBytes,
    encrypted_key_material: SecureBytes,
    tag: SecureBytes,
    enforced: AuthorizationSet,
    unenforced: AuthorizationSet,
    algorithm: Option<u32>,
    key_size_bits: Option<u32>,
    format: BlobFormat,
    error: ErrorCode,
}

impl KeyBlob {
    /// Create a blob from its authorization sets
    ///
    /// The key material is attached afterwards with
    /// [`set_encrypted_key`](Self::set_encrypted_key).
    pub fn new(enforced: AuthorizationSet, unenforced: AuthorizationSet) -> Self {
        Self {
            nonce: SecureBytes::default(),
            encrypted_key_material: SecureBytes::default(),
            tag: SecureBytes::default(),
            enforced,
            unenforced,
            algorithm: None,
            key_size_bits: None,
            format: BlobFormat::Versioned,
            error: ErrorCode::Ok,
        }
    }

    /// Parse a serialized blob
    ///
    /// Always returns an object; check [`error`](Self::error) to find out
    /// whether parsing succeeded.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut blob = Self::new(AuthorizationSet::new(), AuthorizationSet::new());
        let mut input = bytes;
        if let Err(code) = blob.deserialize(&mut input) {
            debug!("Key blob of {} bytes rejected: {}", bytes.len(), code);
        }
        blob
    }

    /// Parse the bytes bundled in a `KeymasterKeyBlob`
    pub fn from_key_blob(key_blob: &KeymasterKeyBlob) -> Self {
        Self::from_bytes(key_blob.as_bytes())
    }

    /// Parse a serialized blob, returning an error if it is unusable
    pub fn parse(bytes: &[u8]) -> CryptoResult<Self> {
        let blob = Self::from_bytes(bytes);
        match blob.error {
            ErrorCode::Ok => Ok(blob),
            code => Err(CryptoError::from(code)
                .with_context("blob_length", &bytes.len().to_string())),
        }
    }

    /// Read a blob from the front of `input`
    ///
    /// The versioned layout is tried first. If it fails for any reason the
    /// same bytes are parsed again as a legacy blob. On success `input` is
    /// advanced past the blob. Failures are also recorded as the sticky
    /// [`error`](Self::error). If neither layout parses, the blob's fields
    /// are left untouched.
    ///
    /// A legacy blob is misread as versioned only if its first five nonce
    /// bytes happen to be `0x00` followed by the little-endian encoding of
    /// `NONCE_LENGTH`. Legacy nonces were random, so this has probability
    /// 2^-40 before the rest of the structure is even checked. That residual
    /// risk is accepted: tightening detection would strand legacy keys.
    pub fn deserialize(&mut self, input: &mut &[u8]) -> Result<(), ErrorCode> {
        let snapshot = ByteReader::new(*input);

        let mut reader = snapshot;
        let (parsed, format) = match parse_versioned(&mut reader) {
            Ok(parsed) => (parsed, BlobFormat::Versioned),
            Err(reason) => {
                #[cfg(feature = "debug")]
                log::trace!("Versioned parse stopped at offset {}", reader.position());
                debug!("Not a versioned key blob ({}), trying legacy layout", reason);

                reader = snapshot;
                match parse_legacy(&mut reader) {
                    Ok(parsed) => {
                        debug!("Parsed legacy key blob of {} bytes", reader.position());
                        (parsed, BlobFormat::Legacy)
                    }
                    Err(reason) => {
                        warn!("Invalid key blob: {}", reason);
                        self.error = ErrorCode::from(reason);
                        return Err(self.error);
                    }
                }
            }
        };

        self.adopt(parsed, format);
        *input = reader.rest();
        self.extract_key_characteristics()
    }

    fn adopt(&mut self, parsed: ParsedBlob, format: BlobFormat) {
        self.nonce = parsed.nonce;
        self.encrypted_key_material = parsed.encrypted_key_material;
        self.tag = parsed.tag;
        self.enforced = parsed.enforced;
        self.unenforced = parsed.unenforced;
        self.algorithm = None;
        self.key_size_bits = None;
        self.format = format;
    }

    /// Enforced authorizations take precedence over unenforced ones
    fn extract_key_characteristics(&mut self) -> Result<(), ErrorCode> {
        let algorithm = self
            .enforced
            .get_enum(Tag::ALGORITHM)
            .or_else(|| self.unenforced.get_enum(Tag::ALGORITHM));
        match algorithm {
            Some(value) => self.algorithm = Some(value),
            None => {
                warn!("Key blob has no ALGORITHM authorization");
                self.error = ErrorCode::UnsupportedAlgorithm;
                return Err(self.error);
            }
        }

        let key_size_bits = self
            .enforced
            .get_uint(Tag::KEY_SIZE)
            .or_else(|| self.unenforced.get_uint(Tag::KEY_SIZE));
        match key_size_bits {
            Some(bits) => self.key_size_bits = Some(bits),
            None => {
                warn!("Key blob has no KEY_SIZE authorization");
                self.error = ErrorCode::UnsupportedKeySize;
                return Err(self.error);
            }
        }
        Ok(())
    }

    /// Replace the encrypted key material, nonce and tag
    ///
    /// The previous buffers are zeroed before the new ones are adopted.
    pub fn set_encrypted_key(
        &mut self,
        encrypted_key_material: impl Into<SecureBytes>,
        nonce: [u8; NONCE_LENGTH],
        tag: [u8; TAG_LENGTH],
    ) {
        self.clear_key_data();
        self.encrypted_key_material = encrypted_key_material.into();
        self.nonce = SecureBytes::new(&nonce);
        self.tag = SecureBytes::new(&tag);
    }

    fn clear_key_data(&mut self) {
        self.encrypted_key_material.clear();
        self.nonce.clear();
        self.tag.clear();
    }

    /// Exact number of bytes [`serialize_into`](Self::serialize_into) writes
    pub fn serialized_size(&self) -> usize {
        1 + LENGTH_PREFIX_SIZE
            + NONCE_LENGTH
            + LENGTH_PREFIX_SIZE
            + self.key_material_length()
            + LENGTH_PREFIX_SIZE
            + TAG_LENGTH
            + self.enforced.serialized_size()
            + self.unenforced.serialized_size()
    }

    /// Write the versioned blob into `out`, returning the number of bytes
    /// written
    ///
    /// Nothing is written past the end of `out`; a short buffer yields an
    /// `InsufficientBufferSpace` error.
    pub fn serialize_into(&self, out: &mut [u8]) -> CryptoResult<usize> {
        if self.nonce.len() != NONCE_LENGTH || self.tag.len() != TAG_LENGTH {
            return Err(CryptoError::invalid_parameter(
                "key_material",
                "encrypted key attached with set_encrypted_key",
                "no key material",
            ));
        }

        let mut writer = ByteWriter::new(out);
        writer.write_u8(BLOB_VERSION)?;
        writer.append_size_and_data(self.nonce.as_bytes())?;
        writer.append_size_and_data(self.encrypted_key_material.as_bytes())?;
        writer.append_size_and_data(self.tag.as_bytes())?;
        self.enforced.serialize(&mut writer)?;
        self.unenforced.serialize(&mut writer)?;

        // A mismatch means serialized_size and the writer disagree on the format
        assert_eq!(writer.position(), self.serialized_size());
        Ok(writer.position())
    }

    /// Serialize the blob into a newly allocated vector
    pub fn serialize(&self) -> CryptoResult<Vec<u8>> {
        let mut out = vec![0u8; self.serialized_size()];
        self.serialize_into(&mut out)?;
        Ok(out)
    }

    /// Serialize into a `KeymasterKeyBlob` record
    pub fn to_key_blob(&self) -> CryptoResult<KeymasterKeyBlob> {
        self.serialize().map(KeymasterKeyBlob::new)
    }

    pub fn nonce(&self) -> &[u8] {
        self.nonce.as_bytes()
    }

    pub fn tag(&self) -> &[u8] {
        self.tag.as_bytes()
    }

    pub fn encrypted_key_material(&self) -> &[u8] {
        self.encrypted_key_material.as_bytes()
    }

    pub fn key_material_length(&self) -> usize {
        self.encrypted_key_material.len()
    }

    pub fn enforced(&self) -> &AuthorizationSet {
        &self.enforced
    }

    pub fn unenforced(&self) -> &AuthorizationSet {
        &self.unenforced
    }

    /// Algorithm found in the authorizations of a parsed blob
    ///
    /// `None` if the blob has not been parsed, or if the stored value is not
    /// one of the algorithms in [`Algorithm`]. See
    /// [`algorithm_value`](Self::algorithm_value) for the raw value.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm.and_then(|value| Algorithm::try_from(value).ok())
    }

    /// Raw ALGORITHM value found in the authorizations of a parsed blob
    pub fn algorithm_value(&self) -> Option<u32> {
        self.algorithm
    }

    /// Key size found in the authorizations of a parsed blob
    pub fn key_size_bits(&self) -> Option<u32> {
        self.key_size_bits
    }

    pub fn format(&self) -> BlobFormat {
        self.format
    }

    /// Most recent failure, or `ErrorCode::Ok` if nothing has failed
    pub fn error(&self) -> ErrorCode {
        self.error
    }

    pub fn characteristics(&self) -> KeyCharacteristics {
        KeyCharacteristics {
            algorithm: self.algorithm(),
            algorithm_value: self.algorithm,
            key_size_bits: self.key_size_bits,
            format: self.format,
            enforced: self.enforced.clone(),
            unenforced: self.unenforced.clone(),
        }
    }
}

impl Default for KeyBlob {
    fn default() -> Self {
        Self::new(AuthorizationSet::new(), AuthorizationSet::new())
    }
}

impl fmt::Debug for KeyBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBlob")
            .field("format", &self.format)
            .field("nonce", &hex::encode(self.nonce.as_bytes()))
            .field("encrypted_key_material", &self.encrypted_key_material)
            .field("tag", &hex::encode(self.tag.as_bytes()))
            .field("algorithm", &self.algorithm)
            .field("key_size_bits", &self.key_size_bits)
            .field("enforced", &self.enforced)
            .field("unenforced", &self.unenforced)
            .field("error", &self.error)
            .finish()
    }
}
