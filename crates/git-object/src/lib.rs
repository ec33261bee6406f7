//! Object model for minigit.
//!
//! Objects are `{kind, content}` pairs. Their stored form is
//! `"<kind> <len>\0" + content` and their identity is the SHA-1 of that
//! form. This crate knows how to build and take apart that framing, and
//! how to parse and serialize the structured kinds (trees and commits).

mod commit;
pub mod header;
mod signature;
mod tree;

pub use commit::Commit;
pub use signature::{GitDate, Signature};
pub use tree::{FileMode, Tree, TreeEntry};

use bstr::BString;
use git_hash::hasher::Hasher;
use git_hash::{HashError, ObjectId};

/// Errors produced by object operations.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object type: {0}")]
    InvalidType(BString),

    #[error("invalid object header: {0}")]
    InvalidHeader(String),

    #[error("object length mismatch: header declares {expected} bytes, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid tree entry at offset {offset}: {reason}")]
    InvalidTreeEntry { offset: usize, reason: String },

    #[error("invalid commit: missing '{field}' header")]
    MissingCommitField { field: &'static str },

    #[error("invalid file mode: {0}")]
    InvalidFileMode(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// The four kinds of objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    /// Parse from the type token in object headers.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        match s {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            b"tag" => Ok(Self::Tag),
            _ => Err(ObjectError::InvalidType(BString::from(s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = ObjectError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// An object as the store sees it: a kind and opaque content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub kind: ObjectType,
    pub data: Vec<u8>,
}

impl RawObject {
    pub fn new(kind: ObjectType, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    /// Parse the stored form (header + content).
    ///
    /// The declared length must match the content exactly, so a truncated
    /// or padded record is rejected.
    pub fn parse(stored: &[u8]) -> Result<Self, ObjectError> {
        let (kind, content) = header::split_object(stored)?;
        Ok(Self::new(kind, content))
    }

    /// The stored form: `"<kind> <len>\0" + content`.
    pub fn serialize(&self) -> Vec<u8> {
        let hdr = header::write_header(self.kind, self.data.len());
        let mut out = Vec::with_capacity(hdr.len() + self.data.len());
        out.extend_from_slice(&hdr);
        out.extend_from_slice(&self.data);
        out
    }

    /// The object's identity.
    pub fn id(&self) -> Result<ObjectId, HashError> {
        Hasher::hash_object(self.kind.as_str(), &self.data)
    }
}
