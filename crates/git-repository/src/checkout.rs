//! Write a stored tree out to the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use bstr::{BStr, ByteSlice};
use git_hash::ObjectId;
use git_object::{FileMode, ObjectType};
use git_odb::{ObjectStore, OdbError};
use tracing::{debug, warn};

use crate::RepoError;

/// Counts from one [`materialize`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckoutStats {
    pub files: usize,
    pub directories: usize,
    /// Entries with a mode other than `100644` or `40000`.
    pub skipped: usize,
}

/// Recreate the tree `tree` under `dir`, creating `dir` if needed.
///
/// Existing files with the same names are overwritten; nothing is removed.
/// Entry names that could escape `dir` (`..`, names with `/`) or touch
/// the repository metadata (`.git`) are rejected.
pub fn materialize(
    store: &ObjectStore,
    dir: &Path,
    tree: &ObjectId,
) -> Result<CheckoutStats, RepoError> {
    let mut stats = CheckoutStats::default();
    render(store, dir, tree, &mut stats)?;
    debug!(dir = %dir.display(), ?stats, "checked out tree");
    Ok(stats)
}

fn render(
    store: &ObjectStore,
    dir: &Path,
    tree: &ObjectId,
    stats: &mut CheckoutStats,
) -> Result<(), RepoError> {
    fs::create_dir_all(dir)?;
    stats.directories += 1;

    for entry in store.read_tree(tree)?.iter() {
        let path = entry_path(dir, entry.name.as_bstr())?;
        match entry.mode {
            FileMode::Tree => render(store, &path, &entry.oid, stats)?,
            FileMode::Regular => {
                let blob = store.read(&entry.oid)?;
                if blob.kind != ObjectType::Blob {
                    return Err(OdbError::UnexpectedKind {
                        oid: entry.oid,
                        expected: ObjectType::Blob,
                        actual: blob.kind,
                    }
                    .into());
                }
                fs::write(&path, &blob.data)?;
                stats.files += 1;
            }
            FileMode::Other(mode) => {
                warn!(
                    path = %path.display(),
                    mode = format_args!("{mode:o}"),
                    "skipping unsupported tree entry"
                );
                stats.skipped += 1;
            }
        }
    }
    Ok(())
}

fn entry_path(dir: &Path, name: &BStr) -> Result<PathBuf, RepoError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name == ".git"
        || name.contains(&b'/')
        || name.contains(&b'\\')
        || name.contains(&0);
    if unsafe_name {
        return Err(RepoError::UnsafePath(name.to_owned()));
    }
    let component = name
        .to_path()
        .map_err(|_| RepoError::UnsafePath(name.to_owned()))?;
    Ok(dir.join(component))
}
