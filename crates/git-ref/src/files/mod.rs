pub(crate) mod loose;

use std::path::{Path, PathBuf};

use git_hash::ObjectId;
use tracing::debug;

use crate::error::RefError;
use crate::name::RefName;
use crate::Reference;

/// Maximum depth for following symbolic ref chains.
const MAX_SYMREF_DEPTH: usize = 5;

/// Loose-file ref store rooted at a `.git` directory.
///
/// Every ref is one file: `refs/heads/<name>` holds a hex id, `HEAD`
/// holds `ref: refs/heads/<name>` or, when detached, a hex id.
#[derive(Debug, Clone)]
pub struct FilesRefStore {
    git_dir: PathBuf,
}

impl FilesRefStore {
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Read a ref without following it.
    pub fn find(&self, name: &RefName) -> Result<Option<Reference>, RefError> {
        loose::read_loose_ref(&self.git_dir, name)
    }

    /// Resolve a ref to an object id, following symbolic refs.
    ///
    /// `Ok(None)` when the chain ends at a ref that does not exist yet, as
    /// `HEAD` does in a fresh repository.
    pub fn resolve(&self, name: &RefName) -> Result<Option<ObjectId>, RefError> {
        let mut current = name.clone();
        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.find(&current)? {
                None => return Ok(None),
                Some(Reference::Direct { target, .. }) => return Ok(Some(target)),
                Some(Reference::Symbolic { target, .. }) => current = target,
            }
        }
        Err(RefError::SymrefLoop(name.to_string()))
    }

    pub fn write_ref(&self, name: &RefName, oid: &ObjectId) -> Result<(), RefError> {
        debug!(%name, %oid, "updating ref");
        loose::write_loose_ref(&self.git_dir, name, oid)
    }

    pub fn write_symbolic_ref(&self, name: &RefName, target: &RefName) -> Result<(), RefError> {
        debug!(%name, %target, "updating symbolic ref");
        loose::write_symbolic_ref(&self.git_dir, name, target)
    }

    /// Point `HEAD` at `branch`.
    pub fn set_head(&self, branch: &RefName) -> Result<(), RefError> {
        self.write_symbolic_ref(&RefName::head(), branch)
    }

    /// Detach `HEAD` at `oid`.
    pub fn set_head_detached(&self, oid: &ObjectId) -> Result<(), RefError> {
        self.write_ref(&RefName::head(), oid)
    }

    /// The branch `HEAD` points at, or `None` when detached or missing.
    pub fn head_branch(&self) -> Result<Option<RefName>, RefError> {
        Ok(self
            .find(&RefName::head())?
            .and_then(|r| r.symbolic_target().cloned()))
    }

    /// Move whatever `HEAD` stands for to `oid`: the branch it points at
    /// (created if unborn), or `HEAD` itself when detached. Returns the
    /// ref that was written.
    pub fn update_head(&self, oid: &ObjectId) -> Result<RefName, RefError> {
        let mut current = RefName::head();
        for _ in 0..=MAX_SYMREF_DEPTH {
            match self.find(&current)? {
                Some(Reference::Symbolic { target, .. }) => current = target,
                Some(Reference::Direct { .. }) | None => {
                    self.write_ref(&current, oid)?;
                    return Ok(current);
                }
            }
        }
        Err(RefError::SymrefLoop(RefName::head().to_string()))
    }

    /// All branches with their targets, sorted by name.
    pub fn branches(&self) -> Result<Vec<(RefName, ObjectId)>, RefError> {
        let mut out = Vec::new();
        for name in loose::enumerate_loose_refs(&self.git_dir, "refs/heads")? {
            if let Some(oid) = self.resolve(&name)? {
                out.push((name, oid));
            }
        }
        Ok(out)
    }
}
