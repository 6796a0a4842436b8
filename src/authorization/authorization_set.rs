/*!
 * Authorization sets
 *
 * An `AuthorizationSet` is an ordered list of tagged key parameters describing
 * how a key may be used. Key blobs carry two of them: one for constraints the
 * secure hardware enforces and one for constraints only software checks.
 *
 * Wire format (integers little-endian):
 *
 * ```text
 * [u32 indirect_len][indirect bytes]
 * [u32 element_count][u32 elements_size]
 * elements: [u32 tag][value]
 * ```
 *
 * Integer values are written inline (`u32`, `u64`, or one byte for booleans).
 * Byte-string values are written as `[u32 len][u32 offset]`, pointing into the
 * indirect data.
 */

use serde::{Deserialize, Serialize};

use super::tag::{Algorithm, Tag, TagType};
use crate::error::{CryptoError, CryptoResult, ErrorCode};
use crate::utils::{ByteReader, ByteWriter, ReadError, LENGTH_PREFIX_SIZE};

/// Smallest possible serialized element: a tag plus a boolean
const MIN_ELEMENT_SIZE: usize = 5;

/// Value held by a key parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyParamValue {
    /// ENUM, ENUM_REP, UINT and UINT_REP tags
    Integer(u32),
    /// ULONG, ULONG_REP and DATE tags
    Long(u64),
    Bool(bool),
    /// BIGNUM and BYTES tags
    Blob(Vec<u8>),
}

impl KeyParamValue {
    fn matches(&self, tag_type: TagType) -> bool {
        match self {
            KeyParamValue::Integer(_) => matches!(
                tag_type,
                TagType::Enum | TagType::EnumRep | TagType::Uint | TagType::UintRep
            ),
            KeyParamValue::Long(_) => {
                matches!(tag_type, TagType::Ulong | TagType::UlongRep | TagType::Date)
            }
            KeyParamValue::Bool(_) => tag_type == TagType::Bool,
            KeyParamValue::Blob(_) => matches!(tag_type, TagType::Bignum | TagType::Bytes),
        }
    }

    fn element_size(&self) -> usize {
        match self {
            KeyParamValue::Integer(_) => 4,
            KeyParamValue::Long(_) => 8,
            KeyParamValue::Bool(_) => 1,
            KeyParamValue::Blob(_) => 8,
        }
    }
}

/// A single tagged authorization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyParameter {
    pub tag: Tag,
    pub value: KeyParamValue,
}

impl KeyParameter {
    /// Create a parameter, checking that the value type agrees with the tag type
    pub fn new(tag: Tag, value: KeyParamValue) -> CryptoResult<Self> {
        if !value.matches(tag.tag_type()) {
            return Err(CryptoError::authorization_error(
                "create_parameter",
                &format!("{:?} cannot hold {:?}", tag, value),
                ErrorCode::InvalidTag,
            ));
        }
        Ok(Self { tag, value })
    }
}

/// Ordered collection of key parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSet {
    params: Vec<KeyParameter>,
}

impl AuthorizationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from parameters, validating each of them
    pub fn from_params(params: Vec<KeyParameter>) -> CryptoResult<Self> {
        let mut set = Self::new();
        for param in params {
            set.push(param.tag, param.value)?;
        }
        Ok(set)
    }

    /// Append a parameter
    ///
    /// Fails with `InvalidTag` if the value does not fit the tag type, or if a
    /// non-repeatable tag is already present.
    pub fn push(&mut self, tag: Tag, value: KeyParamValue) -> CryptoResult<()> {
        let param = KeyParameter::new(tag, value)?;
        if !tag.tag_type().is_repeatable() && self.contains(tag) {
            return Err(CryptoError::authorization_error(
                "push",
                &format!("{:?} is not repeatable and is already present", tag),
                ErrorCode::InvalidTag,
            ));
        }
        self.params.push(param);
        Ok(())
    }

    pub fn push_enum(&mut self, tag: Tag, value: u32) -> CryptoResult<()> {
        self.push(tag, KeyParamValue::Integer(value))
    }

    pub fn push_uint(&mut self, tag: Tag, value: u32) -> CryptoResult<()> {
        self.push(tag, KeyParamValue::Integer(value))
    }

    pub fn push_ulong(&mut self, tag: Tag, value: u64) -> CryptoResult<()> {
        self.push(tag, KeyParamValue::Long(value))
    }

    pub fn push_date(&mut self, tag: Tag, millis_since_epoch: u64) -> CryptoResult<()> {
        self.push(tag, KeyParamValue::Long(millis_since_epoch))
    }

    pub fn push_bool(&mut self, tag: Tag) -> CryptoResult<()> {
        self.push(tag, KeyParamValue::Bool(true))
    }

    pub fn push_blob(&mut self, tag: Tag, data: &[u8]) -> CryptoResult<()> {
        self.push(tag, KeyParamValue::Blob(data.to_vec()))
    }

    pub fn push_algorithm(&mut self, algorithm: Algorithm) -> CryptoResult<()> {
        self.push_enum(Tag::ALGORITHM, algorithm as u32)
    }

    pub fn push_key_size(&mut self, bits: u32) -> CryptoResult<()> {
        self.push_uint(Tag::KEY_SIZE, bits)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KeyParameter> {
        self.params.iter()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.find(tag, 0).is_some()
    }

    /// Index of the first entry for `tag` at or after `start`
    pub fn find(&self, tag: Tag, start: usize) -> Option<usize> {
        self.params
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, p)| p.tag == tag)
            .map(|(i, _)| i)
    }

    /// Value of the first entry for `tag`, if any
    pub fn get_tag_value(&self, tag: Tag) -> Option<&KeyParamValue> {
        self.find(tag, 0).map(|i| &self.params[i].value)
    }

    pub fn get_enum(&self, tag: Tag) -> Option<u32> {
        if !matches!(tag.tag_type(), TagType::Enum | TagType::EnumRep) {
            return None;
        }
        match self.get_tag_value(tag) {
            Some(KeyParamValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_uint(&self, tag: Tag) -> Option<u32> {
        if !matches!(tag.tag_type(), TagType::Uint | TagType::UintRep) {
            return None;
        }
        match self.get_tag_value(tag) {
            Some(KeyParamValue::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_ulong(&self, tag: Tag) -> Option<u64> {
        match self.get_tag_value(tag) {
            Some(KeyParamValue::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, tag: Tag) -> bool {
        matches!(self.get_tag_value(tag), Some(KeyParamValue::Bool(true)))
    }

    pub fn get_blob(&self, tag: Tag) -> Option<&[u8]> {
        match self.get_tag_value(tag) {
            Some(KeyParamValue::Blob(data)) => Some(data),
            _ => None,
        }
    }

    fn indirect_data_size(&self) -> usize {
        self.params
            .iter()
            .map(|p| match &p.value {
                KeyParamValue::Blob(data) => data.len(),
                _ => 0,
            })
            .sum()
    }

    fn elements_size(&self) -> usize {
        self.params
            .iter()
            .map(|p| LENGTH_PREFIX_SIZE + p.value.element_size())
            .sum()
    }

    /// Exact number of bytes `serialize` writes
    pub fn serialized_size(&self) -> usize {
        LENGTH_PREFIX_SIZE
            + self.indirect_data_size()
            + LENGTH_PREFIX_SIZE
            + LENGTH_PREFIX_SIZE
            + self.elements_size()
    }

    pub fn serialize(&self, writer: &mut ByteWriter<'_>) -> CryptoResult<()> {
        let to_u32 = |value: usize, what: &str| {
            u32::try_from(value).map_err(|_| {
                CryptoError::invalid_parameter(what, "at most u32::MAX", &value.to_string())
            })
        };

        let mut indirect = Vec::with_capacity(self.indirect_data_size());
        for param in &self.params {
            if let KeyParamValue::Blob(data) = &param.value {
                indirect.extend_from_slice(data);
            }
        }
        writer.append_size_and_data(&indirect)?;
        writer.write_u32(to_u32(self.params.len(), "element_count")?)?;
        writer.write_u32(to_u32(self.elements_size(), "elements_size")?)?;

        let mut offset = 0usize;
        for param in &self.params {
            writer.write_u32(param.tag.0)?;
            match &param.value {
                KeyParamValue::Integer(v) => writer.write_u32(*v)?,
                KeyParamValue::Long(v) => writer.write_u64(*v)?,
                KeyParamValue::Bool(v) => writer.write_u8(u8::from(*v))?,
                KeyParamValue::Blob(data) => {
                    writer.write_u32(to_u32(data.len(), "blob_length")?)?;
                    writer.write_u32(to_u32(offset, "blob_offset")?)?;
                    offset += data.len();
                }
            }
        }
        Ok(())
    }

    /// Parse a set from `reader`, advancing it only on success
    pub fn deserialize(reader: &mut ByteReader<'_>) -> Result<Self, ReadError> {
        let mut cursor = *reader;
        let indirect = cursor.read_size_and_data()?;
        let count = cursor.read_u32()? as usize;
        let elements_size = cursor.read_u32()? as usize;
        let elements = cursor.read_bytes(elements_size)?;

        if count.saturating_mul(MIN_ELEMENT_SIZE) > elements_size {
            return Err(ReadError::Malformed("element count exceeds element data"));
        }

        let mut params = Vec::new();
        params
            .try_reserve_exact(count)
            .map_err(|_| ReadError::AllocationFailed(count))?;

        let mut element_reader = ByteReader::new(elements);
        for _ in 0..count {
            let tag = Tag(element_reader.read_u32()?);
            let value = match tag.tag_type() {
                TagType::Enum | TagType::EnumRep | TagType::Uint | TagType::UintRep => {
                    KeyParamValue::Integer(element_reader.read_u32()?)
                }
                TagType::Ulong | TagType::UlongRep | TagType::Date => {
                    KeyParamValue::Long(element_reader.read_u64()?)
                }
                TagType::Bool => KeyParamValue::Bool(element_reader.read_u8()? != 0),
                TagType::Bignum | TagType::Bytes => {
                    let len = element_reader.read_u32()? as usize;
                    let offset = element_reader.read_u32()? as usize;
                    let end = offset
                        .checked_add(len)
                        .filter(|end| *end <= indirect.len())
                        .ok_or(ReadError::Malformed("blob value outside indirect data"))?;
                    KeyParamValue::Blob(indirect[offset..end].to_vec())
                }
                TagType::Invalid => return Err(ReadError::Malformed("unknown tag type")),
            };
            params.push(KeyParameter { tag, value });
        }

        if element_reader.remaining() != 0 {
            return Err(ReadError::Malformed("trailing bytes after elements"));
        }

        *reader = cursor;
        Ok(Self { params })
    }

    /// Algorithm declared by this set
    ///
    /// `Some(Err(raw))` means the tag is present but its value is not a known
    /// algorithm.
    pub fn algorithm(&self) -> Option<Result<Algorithm, u32>> {
        self.get_enum(Tag::ALGORITHM).map(Algorithm::try_from)
    }
}

impl<'a> IntoIterator for &'a AuthorizationSet {
    type Item = &'a KeyParameter;
    type IntoIter = std::slice::Iter<'a, KeyParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
