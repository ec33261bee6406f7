//! References for minigit repositories.
//!
//! Refs are loose files under the git directory: `refs/heads/<name>`
//! holds `<hex>\n` and `HEAD` holds `ref: refs/heads/<name>\n` (or a bare
//! id when detached). Writes go through a `<file>.lock` that is renamed
//! into place.

mod error;
mod files;
mod lock;
mod name;

pub use error::RefError;
pub use files::FilesRefStore;
pub use name::RefName;

use git_hash::ObjectId;

/// A git reference: either direct (points to an id) or symbolic (points
/// to another ref).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Direct { name: RefName, target: ObjectId },
    Symbolic { name: RefName, target: RefName },
}

impl Reference {
    pub fn name(&self) -> &RefName {
        match self {
            Reference::Direct { name, .. } | Reference::Symbolic { name, .. } => name,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Reference::Symbolic { .. })
    }

    /// The target id if this is a direct ref.
    pub fn target_oid(&self) -> Option<ObjectId> {
        match self {
            Reference::Direct { target, .. } => Some(*target),
            Reference::Symbolic { .. } => None,
        }
    }

    /// The target ref if this is a symbolic ref.
    pub fn symbolic_target(&self) -> Option<&RefName> {
        match self {
            Reference::Symbolic { target, .. } => Some(target),
            Reference::Direct { .. } => None,
        }
    }
}
