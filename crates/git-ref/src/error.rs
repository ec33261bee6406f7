use std::path::PathBuf;

/// Error types for reference operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("invalid ref name: {0}")]
    InvalidName(String),

    #[error("symbolic ref loop detected: {0}")]
    SymrefLoop(String),

    #[error("malformed ref {name}: {reason}")]
    Parse { name: String, reason: String },

    #[error("unable to lock {path}: lock file already exists")]
    Locked { path: PathBuf },

    #[error("directory-file conflict: cannot create ref '{name}' because '{conflict}' exists")]
    DirectoryConflict { name: String, conflict: String },

    #[error("I/O error on {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Hash(#[from] git_hash::HashError),
}
