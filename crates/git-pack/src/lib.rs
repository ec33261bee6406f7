//! Pack stream parsing and delta resolution.
//!
//! A pack is a header (`PACK`, version, object count) followed by
//! back-to-back entries and a SHA-1 trailer. Each entry is a
//! variable-length type/size header and a zlib stream; ref-delta entries
//! carry the 20-byte id of their base before the zlib stream. Entries
//! have no explicit length, so the parser advances by exactly the number
//! of compressed bytes the inflater consumed.
//!
//! Packs arrive here already stripped of their 8-byte signature and
//! version (the fetch protocol validates and removes them), so
//! [`PackStream`] input begins with the object count.

pub mod delta;
pub mod entry;
mod stream;
pub mod verify;

pub use stream::{EntryPayload, PackCursor, PackEntry, PackStream, Trailer};

use git_hash::ObjectId;
use git_object::ObjectType;

/// Errors that can occur while reading a pack stream.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack header: {0}")]
    InvalidHeader(String),

    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: usize, reason: String },

    #[error("zlib error in pack entry at offset {offset}: {reason}")]
    Decompress { offset: usize, reason: String },

    #[error("invalid delta at offset {offset}: {reason}")]
    InvalidDelta { offset: usize, reason: String },

    #[error("unsupported pack entry type {type_name} at offset {offset}")]
    Unsupported {
        type_name: &'static str,
        offset: usize,
    },

    #[error("pack checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: ObjectId, actual: ObjectId },

    #[error(transparent)]
    Hash(#[from] git_hash::HashError),
}

/// Type of a pack entry, from bits 4-6 of its first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEntryType {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta against an earlier entry of the same pack, by offset.
    OfsDelta,
    /// Delta against an object named by its id.
    RefDelta,
}

impl PackEntryType {
    /// Map a 3-bit type number. 0 and 5 are reserved.
    pub fn from_type_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            6 => Some(Self::OfsDelta),
            7 => Some(Self::RefDelta),
            _ => None,
        }
    }

    pub fn type_number(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
            Self::OfsDelta => 6,
            Self::RefDelta => 7,
        }
    }

    /// The object kind stored directly by this entry, `None` for deltas.
    pub fn to_object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag => Some(ObjectType::Tag),
            Self::OfsDelta | Self::RefDelta => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
            Self::OfsDelta => "ofs_delta",
            Self::RefDelta => "ref_delta",
        }
    }
}

pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
/// Signature plus version: the prefix stripped before parsing.
pub const PACK_PREFIX_SIZE: usize = 8;
pub const PACK_TRAILER_SIZE: usize = 20;

/// Check a pack's signature and version and return the version.
///
/// `data` must start with the 8-byte prefix. Versions 2 and 3 share the
/// same entry format.
pub fn parse_pack_prefix(data: &[u8]) -> Result<u32, PackError> {
    if data.len() < PACK_PREFIX_SIZE {
        return Err(PackError::InvalidHeader(format!(
            "pack too short: {} bytes",
            data.len()
        )));
    }
    if &data[..4] != PACK_SIGNATURE {
        return Err(PackError::InvalidHeader("missing PACK signature".into()));
    }
    let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    if version != 2 && version != 3 {
        return Err(PackError::InvalidHeader(format!(
            "unsupported pack version {version}"
        )));
    }
    Ok(version)
}
