//! Authorization tags and the enumerated values they carry
//!
//! A tag is a `u32` whose top four bits encode the type of value it holds and
//! whose low bits identify the attribute, following keymaster numbering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of the value an authorization tag carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
    Invalid,
    Enum,
    EnumRep,
    Uint,
    UintRep,
    Ulong,
    Date,
    Bool,
    Bignum,
    Bytes,
    UlongRep,
}

impl TagType {
    const SHIFT: u32 = 28;

    /// The type bits as they appear in a tag value
    pub const fn bits(self) -> u32 {
        let raw = match self {
            TagType::Invalid => 0,
            TagType::Enum => 1,
            TagType::EnumRep => 2,
            TagType::Uint => 3,
            TagType::UintRep => 4,
            TagType::Ulong => 5,
            TagType::Date => 6,
            TagType::Bool => 7,
            TagType::Bignum => 8,
            TagType::Bytes => 9,
            TagType::UlongRep => 10,
        };
        raw << Self::SHIFT
    }

    fn from_bits(raw: u32) -> Self {
        match raw >> Self::SHIFT {
            1 => TagType::Enum,
            2 => TagType::EnumRep,
            3 => TagType::Uint,
            4 => TagType::UintRep,
            5 => TagType::Ulong,
            6 => TagType::Date,
            7 => TagType::Bool,
            8 => TagType::Bignum,
            9 => TagType::Bytes,
            10 => TagType::UlongRep,
            _ => TagType::Invalid,
        }
    }

    /// Whether a set may hold several entries of a tag of this type
    pub fn is_repeatable(self) -> bool {
        matches!(self, TagType::EnumRep | TagType::UintRep | TagType::UlongRep)
    }
}

/// An authorization tag
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u32);

impl Tag {
    const fn new(tag_type: TagType, id: u32) -> Self {
        Tag(tag_type.bits() | id)
    }

    pub const PURPOSE: Tag = Tag::new(TagType::EnumRep, 1);
    pub const ALGORITHM: Tag = Tag::new(TagType::Enum, 2);
    pub const KEY_SIZE: Tag = Tag::new(TagType::Uint, 3);
    pub const BLOCK_MODE: Tag = Tag::new(TagType::EnumRep, 4);
    pub const DIGEST: Tag = Tag::new(TagType::EnumRep, 5);
    pub const PADDING: Tag = Tag::new(TagType::EnumRep, 6);
    pub const CALLER_NONCE: Tag = Tag::new(TagType::Bool, 7);
    pub const MIN_MAC_LENGTH: Tag = Tag::new(TagType::Uint, 8);
    pub const RSA_PUBLIC_EXPONENT: Tag = Tag::new(TagType::Ulong, 200);
    pub const ACTIVE_DATETIME: Tag = Tag::new(TagType::Date, 400);
    pub const ORIGINATION_EXPIRE_DATETIME: Tag = Tag::new(TagType::Date, 401);
    pub const USAGE_EXPIRE_DATETIME: Tag = Tag::new(TagType::Date, 402);
    pub const USER_SECURE_ID: Tag = Tag::new(TagType::UlongRep, 502);
    pub const NO_AUTH_REQUIRED: Tag = Tag::new(TagType::Bool, 503);
    pub const AUTH_TIMEOUT: Tag = Tag::new(TagType::Uint, 505);
    pub const APPLICATION_ID: Tag = Tag::new(TagType::Bytes, 601);
    pub const APPLICATION_DATA: Tag = Tag::new(TagType::Bytes, 700);
    pub const CREATION_DATETIME: Tag = Tag::new(TagType::Date, 701);
    pub const ORIGIN: Tag = Tag::new(TagType::Enum, 702);
    pub const ROOT_OF_TRUST: Tag = Tag::new(TagType::Bytes, 704);
    pub const OS_VERSION: Tag = Tag::new(TagType::Uint, 705);
    pub const OS_PATCHLEVEL: Tag = Tag::new(TagType::Uint, 706);

    pub fn tag_type(self) -> TagType {
        TagType::from_bits(self.0)
    }

    /// Attribute number without the type bits
    pub fn id(self) -> u32 {
        self.0 & ((1 << TagType::SHIFT) - 1)
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            Tag::PURPOSE => "PURPOSE",
            Tag::ALGORITHM => "ALGORITHM",
            Tag::KEY_SIZE => "KEY_SIZE",
            Tag::BLOCK_MODE => "BLOCK_MODE",
            Tag::DIGEST => "DIGEST",
            Tag::PADDING => "PADDING",
            Tag::CALLER_NONCE => "CALLER_NONCE",
            Tag::MIN_MAC_LENGTH => "MIN_MAC_LENGTH",
            Tag::RSA_PUBLIC_EXPONENT => "RSA_PUBLIC_EXPONENT",
            Tag::ACTIVE_DATETIME => "ACTIVE_DATETIME",
            Tag::ORIGINATION_EXPIRE_DATETIME => "ORIGINATION_EXPIRE_DATETIME",
            Tag::USAGE_EXPIRE_DATETIME => "USAGE_EXPIRE_DATETIME",
            Tag::USER_SECURE_ID => "USER_SECURE_ID",
            Tag::NO_AUTH_REQUIRED => "NO_AUTH_REQUIRED",
            Tag::AUTH_TIMEOUT => "AUTH_TIMEOUT",
            Tag::APPLICATION_ID => "APPLICATION_ID",
            Tag::APPLICATION_DATA => "APPLICATION_DATA",
            Tag::CREATION_DATETIME => "CREATION_DATETIME",
            Tag::ORIGIN => "ORIGIN",
            Tag::ROOT_OF_TRUST => "ROOT_OF_TRUST",
            Tag::OS_VERSION => "OS_VERSION",
            Tag::OS_PATCHLEVEL => "OS_PATCHLEVEL",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Tag::{}", name),
            None => write!(f, "Tag({:?}, {})", self.tag_type(), self.id()),
        }
    }
}

/// Key algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Algorithm {
    Rsa = 1,
    Ec = 3,
    Aes = 32,
    TripleDes = 33,
    Hmac = 128,
}

impl TryFrom<u32> for Algorithm {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Algorithm::Rsa),
            3 => Ok(Algorithm::Ec),
            32 => Ok(Algorithm::Aes),
            33 => Ok(Algorithm::TripleDes),
            128 => Ok(Algorithm::Hmac),
            other => Err(other),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Rsa => write!(f, "RSA"),
            Algorithm::Ec => write!(f, "EC"),
            Algorithm::Aes => write!(f, "AES"),
            Algorithm::TripleDes => write!(f, "3DES"),
            Algorithm::Hmac => write!(f, "HMAC"),
        }
    }
}

/// Permitted key purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum KeyPurpose {
    Encrypt = 0,
    Decrypt = 1,
    Sign = 2,
    Verify = 3,
    WrapKey = 5,
}

/// Block cipher modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BlockMode {
    Ecb = 1,
    Cbc = 2,
    Ctr = 3,
    Gcm = 32,
}

/// Digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Digest {
    None = 0,
    Md5 = 1,
    Sha1 = 2,
    Sha224 = 3,
    Sha256 = 4,
    Sha384 = 5,
    Sha512 = 6,
}

/// Padding modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PaddingMode {
    None = 1,
    RsaOaep = 2,
    RsaPss = 3,
    RsaPkcs115Encrypt = 4,
    RsaPkcs115Sign = 5,
    Pkcs7 = 64,
}

/// Where a key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum KeyOrigin {
    Generated = 0,
    Derived = 1,
    Imported = 2,
    Unknown = 3,
}
