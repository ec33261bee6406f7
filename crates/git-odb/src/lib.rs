//! Loose object database.
//!
//! Each object lives at `<objects>/XX/YYYY...` where `XX` is the first byte
//! of its id in hex and `YYYY...` the remaining 38 hex characters. The file
//! holds the zlib-compressed stored form `"<kind> <len>\0<content>"`.
//!
//! The store is an explicit handle over one directory; nothing here keeps
//! global state, so tests run against a temporary directory.

mod enumerate;
mod read;
mod unpack;
mod write;

pub use enumerate::ObjectIter;
pub use unpack::{unpack_pack, UnpackStats};

use std::path::{Path, PathBuf};

use git_hash::ObjectId;
use git_object::ObjectType;

/// Zlib level used unless the caller picks another one.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 1;

/// Handle to an objects directory (usually `.git/objects`).
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
    compression: flate2::Compression,
}

impl ObjectStore {
    /// Open the store rooted at `objects_dir`. The directory is created
    /// lazily by the first write.
    pub fn open(objects_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            compression: flate2::Compression::new(DEFAULT_COMPRESSION_LEVEL),
        }
    }

    /// Set the zlib compression level (0–9).
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression = flate2::Compression::new(level.min(9));
        self
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Path of the file that holds (or would hold) `oid`.
    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        let (dir, file) = oid.loose_parts();
        self.objects_dir.join(dir).join(file)
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }
}

/// Errors from object database operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("corrupt object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: ObjectId,
        #[source]
        source: std::io::Error,
    },

    #[error("hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: ObjectId,
        actual: ObjectId,
    },

    #[error("object {oid} is a {actual}, expected {expected}")]
    UnexpectedKind {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error(transparent)]
    Pack(#[from] git_pack::PackError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("object parse error: {0}")]
    Object(#[from] git_object::ObjectError),

    #[error("hash error: {0}")]
    Hash(#[from] git_hash::HashError),
}
