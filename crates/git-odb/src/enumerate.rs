use std::fs;
use std::path::{Path, PathBuf};

use git_hash::ObjectId;

use crate::{ObjectStore, OdbError};

/// Iterator over the ids of all stored objects, in ascending hex order.
///
/// Walks the fan-out directories (`00`–`ff`) one at a time. Files whose
/// names do not form a valid id (temp files and the like) are skipped.
pub struct ObjectIter {
    dirs: std::vec::IntoIter<(String, PathBuf)>,
    current: std::vec::IntoIter<ObjectId>,
}

impl ObjectIter {
    fn new(objects_dir: &Path) -> Result<Self, OdbError> {
        let mut dirs = Vec::new();
        if objects_dir.is_dir() {
            for entry in fs::read_dir(objects_dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().to_lowercase();
                if name.len() == 2
                    && name.bytes().all(|b| b.is_ascii_hexdigit())
                    && entry.file_type()?.is_dir()
                {
                    dirs.push((name, entry.path()));
                }
            }
        }
        dirs.sort();

        Ok(Self {
            dirs: dirs.into_iter(),
            current: Vec::new().into_iter(),
        })
    }

    fn load_dir(prefix: &str, path: &Path) -> Result<Vec<ObjectId>, OdbError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.len() != 38 {
                continue;
            }
            if let Ok(oid) = ObjectId::from_hex(&format!("{prefix}{name}")) {
                ids.push(oid);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl Iterator for ObjectIter {
    type Item = Result<ObjectId, OdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(oid) = self.current.next() {
                return Some(Ok(oid));
            }
            let (prefix, path) = self.dirs.next()?;
            match Self::load_dir(&prefix, &path) {
                Ok(ids) => self.current = ids.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl ObjectStore {
    /// Iterate over all stored object ids.
    pub fn iter(&self) -> Result<ObjectIter, OdbError> {
        ObjectIter::new(&self.objects_dir)
    }
}
