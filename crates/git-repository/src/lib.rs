//! Repository handle for minigit.
//!
//! A [`Repository`] is a working tree with a `.git` directory holding the
//! loose object store and the refs. It is the surface the command line
//! uses: `init`, object read/write, `write_tree`, `commit` and `clone`.

mod checkout;
mod clone;
mod commit;
mod config;
mod env;
mod error;
mod init;
mod tree_builder;

pub use checkout::{materialize, CheckoutStats};
pub use clone::{clone, clone_with_transport};
pub use config::{Identity, RepoConfig, UnreadablePolicy, DEFAULT_USER_AGENT};
pub use env::EnvOverrides;
pub use error::{ErrorKind, RepoError};
pub use tree_builder::TreeBuilder;

use std::path::{Path, PathBuf};

use git_hash::ObjectId;
use git_object::{ObjectType, RawObject};
use git_odb::ObjectStore;
use git_ref::{FilesRefStore, RefName};

pub struct Repository {
    /// Path to the .git directory.
    git_dir: PathBuf,
    work_tree: PathBuf,
    objects: ObjectStore,
    refs: FilesRefStore,
    config: RepoConfig,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("git_dir", &self.git_dir)
            .field("work_tree", &self.work_tree)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open an existing repository with the environment's configuration.
    ///
    /// `path` is either the working tree root or its `.git` directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::open_with(path, RepoConfig::from_env()?)
    }

    /// Open the repository containing `start`, searching parent directories.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, RepoError> {
        let start = start.as_ref();
        let config = RepoConfig::from_env()?;
        for dir in start.ancestors() {
            if is_git_dir(&dir.join(".git")) {
                return Self::open_with(dir, config);
            }
        }
        Err(RepoError::NotARepository(start.to_path_buf()))
    }

    pub fn open_with(path: impl AsRef<Path>, config: RepoConfig) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let (git_dir, work_tree) = if is_git_dir(path) {
            let work_tree = match path.parent() {
                Some(parent) if path.file_name().is_some_and(|n| n == ".git") => {
                    parent.to_path_buf()
                }
                _ => return Err(RepoError::NotARepository(path.to_path_buf())),
            };
            (path.to_path_buf(), work_tree)
        } else if is_git_dir(&path.join(".git")) {
            (path.join(".git"), path.to_path_buf())
        } else {
            return Err(RepoError::NotARepository(path.to_path_buf()));
        };
        Ok(Self::from_parts(git_dir, work_tree, config))
    }

    /// Create a repository in `path` (or reopen the one already there).
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::init_with(path, RepoConfig::from_env()?)
    }

    pub fn init_with(path: impl AsRef<Path>, config: RepoConfig) -> Result<Self, RepoError> {
        RefName::branch(&config.default_branch)?;
        let git_dir = init::init_repository(path.as_ref(), &config.default_branch)?;
        let work_tree = git_dir
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| RepoError::NotARepository(git_dir.clone()))?;
        Ok(Self::from_parts(git_dir, work_tree, config))
    }

    fn from_parts(git_dir: PathBuf, work_tree: PathBuf, config: RepoConfig) -> Self {
        let objects =
            ObjectStore::open(git_dir.join("objects")).with_compression_level(config.compression_level);
        let refs = FilesRefStore::new(&git_dir);
        Self {
            git_dir,
            work_tree,
            objects,
            refs,
            config,
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn refs(&self) -> &FilesRefStore {
        &self.refs
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn read(&self, oid: &ObjectId) -> Result<RawObject, RepoError> {
        Ok(self.objects.read(oid)?)
    }

    pub fn write(&self, kind: ObjectType, content: &[u8]) -> Result<ObjectId, RepoError> {
        Ok(self.objects.write(kind, content)?)
    }

    /// Store the working tree and return its root tree id.
    pub fn write_tree(&self) -> Result<ObjectId, RepoError> {
        TreeBuilder::new(&self.objects, self.config.unreadable).build(&self.work_tree)
    }

    /// Write the tree `tree` into the working tree.
    pub fn checkout_tree(&self, tree: &ObjectId) -> Result<CheckoutStats, RepoError> {
        materialize(&self.objects, &self.work_tree, tree)
    }

    /// Commit `HEAD` resolves to, `None` on an unborn branch.
    pub fn head_oid(&self) -> Result<Option<ObjectId>, RepoError> {
        Ok(self.refs.resolve(&RefName::head())?)
    }

    /// Branch `HEAD` points at, `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>, RepoError> {
        Ok(self
            .refs
            .head_branch()?
            .filter(RefName::is_branch)
            .map(|name| name.short_name().to_string()))
    }
}

fn is_git_dir(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir()
}
