use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::RefError;

const LOCK_SUFFIX: &str = ".lock";

/// RAII guard over `<path>.lock`.
///
/// The lock file is created exclusively, written, and renamed over the
/// target on [`commit`](LockFile::commit). Dropping an uncommitted guard
/// removes the lock file.
pub(crate) struct LockFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl LockFile {
    pub(crate) fn acquire(path: &Path) -> Result<Self, RefError> {
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(LOCK_SUFFIX);
        let lock_path = PathBuf::from(lock_path);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    RefError::Locked {
                        path: lock_path.clone(),
                    }
                } else {
                    RefError::IoPath {
                        path: lock_path.clone(),
                        source: e,
                    }
                }
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            lock_path,
            file: Some(file),
            committed: false,
        })
    }

    /// Write `contents` and rename the lock over the target.
    pub(crate) fn commit_with(mut self, contents: &[u8]) -> Result<(), RefError> {
        let io_err = |source| RefError::IoPath {
            path: self.lock_path.clone(),
            source,
        };
        if let Some(mut file) = self.file.take() {
            file.write_all(contents).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        fs::rename(&self.lock_path, &self.path).map_err(io_err)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}
