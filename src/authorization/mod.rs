//! Key Authorization Sets
//!
//! Tagged key parameters and the `AuthorizationSet` container that key blobs
//! carry as their enforced and unenforced policy.

mod authorization_set;
mod tag;


pub use authorization_set::{AuthorizationSet, KeyParamValue, KeyParameter};
pub use tag::{Algorithm, BlockMode, Digest, KeyOrigin, KeyPurpose, PaddingMode, Tag, TagType};
