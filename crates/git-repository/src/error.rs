use std::path::PathBuf;

use bstr::BString;
use git_odb::OdbError;
use git_pack::PackError;
use git_protocol::ProtocolError;
use git_ref::RefError;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("destination path '{0}' already exists and is not an empty directory")]
    AlreadyExists(PathBuf),

    #[error("unable to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to check out unsafe path {0:?}")]
    UnsafePath(BString),

    #[error("invalid {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error(transparent)]
    Odb(#[from] OdbError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] git_transport::TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`RepoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A missing object, ref or repository.
    NotFound,
    /// Corrupt compressed data, or a malformed header, tree, commit, pack
    /// or delta.
    DecodeError,
    /// `ofs_delta` entries and unknown pack entry types.
    UnsupportedPackEntry,
    /// Network or HTTP failure, or a malformed protocol response.
    TransportError,
    /// Local filesystem failure.
    Io,
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::NotARepository(_) => ErrorKind::NotFound,
            RepoError::AlreadyExists(_) | RepoError::Unreadable { .. } | RepoError::Io(_) => {
                ErrorKind::Io
            }
            RepoError::UnsafePath(_) | RepoError::Object(_) => ErrorKind::DecodeError,
            RepoError::InvalidEnv { .. } => ErrorKind::DecodeError,
            RepoError::Odb(e) => odb_kind(e),
            RepoError::Ref(e) => ref_kind(e),
            RepoError::Pack(e) => pack_kind(e),
            RepoError::Protocol(ProtocolError::Pack(e)) => pack_kind(e),
            RepoError::Protocol(_) | RepoError::Transport(_) => ErrorKind::TransportError,
        }
    }
}

fn odb_kind(e: &OdbError) -> ErrorKind {
    match e {
        OdbError::NotFound(_) => ErrorKind::NotFound,
        OdbError::Pack(e) => pack_kind(e),
        OdbError::Io(_) => ErrorKind::Io,
        OdbError::Corrupt { .. }
        | OdbError::Decompress { .. }
        | OdbError::HashMismatch { .. }
        | OdbError::UnexpectedKind { .. }
        | OdbError::Object(_)
        | OdbError::Hash(_) => ErrorKind::DecodeError,
    }
}

fn ref_kind(e: &RefError) -> ErrorKind {
    match e {
        RefError::Locked { .. } | RefError::DirectoryConflict { .. } | RefError::IoPath { .. } => {
            ErrorKind::Io
        }
        RefError::InvalidName(_)
        | RefError::SymrefLoop(_)
        | RefError::Parse { .. }
        | RefError::Hash(_) => ErrorKind::DecodeError,
    }
}

fn pack_kind(e: &PackError) -> ErrorKind {
    match e {
        PackError::Unsupported { .. } => ErrorKind::UnsupportedPackEntry,
        _ => ErrorKind::DecodeError,
    }
}
