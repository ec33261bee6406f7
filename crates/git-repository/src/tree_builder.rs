//! Snapshot a directory into tree and blob objects.
//!
//! Every regular file becomes a `100644` blob and every directory a
//! `40000` tree. Names starting with `.` (and so the `.git` directory) are
//! left out. Symlinks are followed. The resulting tree id depends only on
//! the names and contents below the root.
//!
//! Files and subdirectories that cannot be read follow the
//! [`UnreadablePolicy`]. The root itself must be readable.

use std::fs;
use std::path::{Path, PathBuf};

use bstr::{BString, ByteVec};
use git_hash::ObjectId;
use git_object::{FileMode, ObjectType, Tree, TreeEntry};
use git_odb::ObjectStore;
use tracing::{debug, warn};

use crate::{RepoError, UnreadablePolicy};

pub struct TreeBuilder<'a> {
    store: &'a ObjectStore,
    policy: UnreadablePolicy,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a ObjectStore, policy: UnreadablePolicy) -> Self {
        Self { store, policy }
    }

    /// Store the directory at `root` and return its tree id.
    pub fn build(&self, root: &Path) -> Result<ObjectId, RepoError> {
        self.build_dir(root)
    }

    /// Store `path` as an entry: a blob for a file, a tree for a
    /// directory. The entry is named after the last path component.
    pub fn build_entry(&self, path: &Path) -> Result<TreeEntry, RepoError> {
        let name = path
            .file_name()
            .map(|n| entry_name(n.to_os_string()))
            .transpose()?
            .ok_or_else(|| {
                RepoError::UnsafePath(BString::from(path.to_string_lossy().as_bytes()))
            })?;
        self.entry_for(path, name)
    }

    fn build_dir(&self, dir: &Path) -> Result<ObjectId, RepoError> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(dir).map_err(|source| RepoError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })? {
            let dirent = dirent?;
            let name = entry_name(dirent.file_name())?;
            if name.starts_with(b".") {
                continue;
            }
            entries.push(self.entry_for(&dirent.path(), name)?);
        }

        let tree: Tree = entries.into_iter().collect();
        let oid = self
            .store
            .write(ObjectType::Tree, &tree.serialize_content())?;
        debug!(dir = %dir.display(), entries = tree.len(), %oid, "stored tree");
        Ok(oid)
    }

    fn entry_for(&self, path: &Path, name: BString) -> Result<TreeEntry, RepoError> {
        if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
            let oid = match self.build_dir(path) {
                // Only a failure to list `path` itself; errors from deeper
                // entries propagate unchanged.
                Err(RepoError::Unreadable { path: failed, source }) if failed == path => {
                    self.unreadable(failed, source)?
                }
                other => other?,
            };
            return Ok(TreeEntry::new(FileMode::Tree, name, oid));
        }

        let oid = match fs::read(path) {
            Ok(content) => self.store.write(ObjectType::Blob, &content)?,
            Err(source) => self.unreadable(path.to_path_buf(), source)?,
        };
        Ok(TreeEntry::new(FileMode::Regular, name, oid))
    }

    /// Apply the policy to a file or directory that could not be read.
    fn unreadable(&self, path: PathBuf, source: std::io::Error) -> Result<ObjectId, RepoError> {
        match self.policy {
            UnreadablePolicy::Fail => Err(RepoError::Unreadable { path, source }),
            UnreadablePolicy::SubstituteNull => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "unreadable entry recorded with null id"
                );
                Ok(ObjectId::NULL)
            }
        }
    }
}

fn entry_name(name: std::ffi::OsString) -> Result<BString, RepoError> {
    <Vec<u8>>::from_os_string(name)
        .map(BString::from)
        .map_err(|name| RepoError::UnsafePath(BString::from(name.to_string_lossy().as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(dir.path().join("objects"));
        (dir, store)
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let (dir, store) = setup();
        let root = dir.path().join("work");
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".hidden"), "x").unwrap();
        fs::write(root.join("a"), "a").unwrap();

        let oid = TreeBuilder::new(&store, UnreadablePolicy::Fail)
            .build(&root)
            .unwrap();
        let tree = store.read_tree(&oid).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.entries[0].name, "a");
    }

    #[test]
    fn single_file_entry() {
        let (dir, store) = setup();
        let file = dir.path().join("hello.txt");
        fs::write(&file, "hello world").unwrap();

        let entry = TreeBuilder::new(&store, UnreadablePolicy::Fail)
            .build_entry(&file)
            .unwrap();
        assert_eq!(entry.mode, FileMode::Regular);
        assert_eq!(entry.name, "hello.txt");
        assert_eq!(
            entry.oid.to_hex(),
            "95d09f2b10159347eece71399a7e2e907ea3df4f"
        );
    }

    #[test]
    fn empty_directory_is_the_empty_tree() {
        let (dir, store) = setup();
        let root = dir.path().join("empty");
        fs::create_dir(&root).unwrap();
        let oid = TreeBuilder::new(&store, UnreadablePolicy::Fail)
            .build(&root)
            .unwrap();
        assert_eq!(oid.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_follows_the_policy() {
        let (dir, store) = setup();
        let root = dir.path().join("work");
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("link")).unwrap();

        let err = TreeBuilder::new(&store, UnreadablePolicy::Fail)
            .build(&root)
            .unwrap_err();
        assert!(matches!(err, RepoError::Unreadable { .. }));

        let oid = TreeBuilder::new(&store, UnreadablePolicy::SubstituteNull)
            .build(&root)
            .unwrap();
        let tree = store.read_tree(&oid).unwrap();
        assert_eq!(tree.entries[0].name, "link");
        assert!(tree.entries[0].oid.is_null());
    }

    #[test]
    fn policy_decides_unreadable_entries() {
        let (dir, store) = setup();
        let path = dir.path().join("locked");
        let denied = || std::io::Error::from(std::io::ErrorKind::PermissionDenied);

        let err = TreeBuilder::new(&store, UnreadablePolicy::Fail)
            .unreadable(path.clone(), denied())
            .unwrap_err();
        assert!(matches!(err, RepoError::Unreadable { path: p, .. } if p == path));

        let oid = TreeBuilder::new(&store, UnreadablePolicy::SubstituteNull)
            .unreadable(path, denied())
            .unwrap();
        assert!(oid.is_null());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_follows_the_policy() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, store) = setup();
        let root = dir.path().join("work");
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("secret"), "x").unwrap();
        fs::write(root.join("a"), "a").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not stop a privileged user.
        let effective = fs::read_dir(&locked).is_err();

        let strict = TreeBuilder::new(&store, UnreadablePolicy::Fail).build(&root);
        let lenient = TreeBuilder::new(&store, UnreadablePolicy::SubstituteNull).build(&root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if !effective {
            return;
        }

        assert!(matches!(
            strict.unwrap_err(),
            RepoError::Unreadable { path, .. } if path == locked
        ));
        let tree = store.read_tree(&lenient.unwrap()).unwrap();
        let entry = tree.find("locked".into()).unwrap();
        assert_eq!(entry.mode, FileMode::Tree);
        assert!(entry.oid.is_null());
        assert!(tree.find("a".into()).is_some());
    }
}
