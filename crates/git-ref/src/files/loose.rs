use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use git_hash::ObjectId;

use crate::error::RefError;
use crate::lock::LockFile;
use crate::name::RefName;
use crate::Reference;

const SYMREF_PREFIX: &[u8] = b"ref: ";

pub(crate) fn loose_ref_path(git_dir: &Path, name: &RefName) -> PathBuf {
    git_dir.join(name.as_str())
}

/// Read a loose ref file.
///
/// The file holds either a hex id or `ref: <target>`, each followed by a
/// newline. `Ok(None)` if the file does not exist.
pub(crate) fn read_loose_ref(
    git_dir: &Path,
    name: &RefName,
) -> Result<Option<Reference>, RefError> {
    let path = loose_ref_path(git_dir, name);
    let contents = match fs::read(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) if path.is_dir() => {
            return Err(RefError::Parse {
                name: name.to_string(),
                reason: format!("{} is a directory ({e})", path.display()),
            })
        }
        Err(e) => return Err(RefError::IoPath { path, source: e }),
    };
    parse_ref_contents(name, contents.trim()).map(Some)
}

fn parse_ref_contents(name: &RefName, contents: &[u8]) -> Result<Reference, RefError> {
    let parse_err = |reason: &str| RefError::Parse {
        name: name.to_string(),
        reason: reason.into(),
    };

    if let Some(target) = contents.strip_prefix(SYMREF_PREFIX) {
        let target = std::str::from_utf8(target.trim())
            .map_err(|_| parse_err("symbolic target is not UTF-8"))?;
        return Ok(Reference::Symbolic {
            name: name.clone(),
            target: RefName::new(target)?,
        });
    }

    let hex = std::str::from_utf8(contents).map_err(|_| parse_err("id is not UTF-8"))?;
    Ok(Reference::Direct {
        name: name.clone(),
        target: ObjectId::from_hex(hex)?,
    })
}

/// Write `<hex>\n` to the ref file.
pub(crate) fn write_loose_ref(
    git_dir: &Path,
    name: &RefName,
    oid: &ObjectId,
) -> Result<(), RefError> {
    write_ref_file(git_dir, name, format!("{}\n", oid.to_hex()).as_bytes())
}

/// Write `ref: <target>\n` to the ref file.
pub(crate) fn write_symbolic_ref(
    git_dir: &Path,
    name: &RefName,
    target: &RefName,
) -> Result<(), RefError> {
    write_ref_file(git_dir, name, format!("ref: {target}\n").as_bytes())
}

fn write_ref_file(git_dir: &Path, name: &RefName, contents: &[u8]) -> Result<(), RefError> {
    let path = loose_ref_path(git_dir, name);
    check_dir_file_conflict(git_dir, name)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RefError::IoPath {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    LockFile::acquire(&path)?.commit_with(contents)
}

/// Refuse `refs/heads/a/b` when `refs/heads/a` is a file, and the reverse.
fn check_dir_file_conflict(git_dir: &Path, name: &RefName) -> Result<(), RefError> {
    let ref_path = loose_ref_path(git_dir, name);
    let conflict = |p: &Path| RefError::DirectoryConflict {
        name: name.to_string(),
        conflict: p.strip_prefix(git_dir).unwrap_or(p).display().to_string(),
    };

    let mut current = git_dir.to_path_buf();
    for component in name.as_str().split('/') {
        current.push(component);
        if current == ref_path {
            break;
        }
        if current.is_file() {
            return Err(conflict(&current));
        }
    }
    if ref_path.is_dir() {
        return Err(conflict(&ref_path));
    }
    Ok(())
}

/// All loose refs below `git_dir/<prefix>`, sorted by name.
pub(crate) fn enumerate_loose_refs(
    git_dir: &Path,
    prefix: &str,
) -> Result<Vec<RefName>, RefError> {
    let mut result = Vec::new();
    collect(git_dir, &git_dir.join(prefix), &mut result)?;
    result.sort();
    Ok(result)
}

fn collect(git_dir: &Path, dir: &Path, result: &mut Vec<RefName>) -> Result<(), RefError> {
    let io_err = |source| RefError::IoPath {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_err(e)),
    };

    for entry in entries {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect(git_dir, &path, result)?;
            continue;
        }
        let Some(rel) = path.strip_prefix(git_dir).ok().and_then(Path::to_str) else {
            continue;
        };
        let rel = rel.replace(std::path::MAIN_SEPARATOR, "/");
        // Lock files and anything else that is not a valid name are skipped.
        if let Ok(name) = RefName::new(rel) {
            result.push(name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex).unwrap()
    }

    #[test]
    fn direct_ref_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let name = RefName::branch("main").unwrap();
        let id = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
        write_loose_ref(dir.path(), &name, &id).unwrap();

        let raw = fs::read_to_string(dir.path().join("refs/heads/main")).unwrap();
        assert_eq!(raw, "da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        assert_eq!(
            read_loose_ref(dir.path(), &name).unwrap(),
            Some(Reference::Direct {
                name,
                target: id
            })
        );
    }

    #[test]
    fn symbolic_ref_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let head = RefName::head();
        let main = RefName::branch("main").unwrap();
        write_symbolic_ref(dir.path(), &head, &main).unwrap();

        let raw = fs::read_to_string(dir.path().join("HEAD")).unwrap();
        assert_eq!(raw, "ref: refs/heads/main\n");
        let r = read_loose_ref(dir.path(), &head).unwrap().unwrap();
        assert_eq!(r.symbolic_target(), Some(&main));
    }

    #[test]
    fn missing_ref_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let name = RefName::branch("nope").unwrap();
        assert!(read_loose_ref(dir.path(), &name).unwrap().is_none());
    }

    #[test]
    fn garbage_ref_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs/heads")).unwrap();
        fs::write(dir.path().join("refs/heads/bad"), b"not a hash\n").unwrap();
        let name = RefName::branch("bad").unwrap();
        assert!(read_loose_ref(dir.path(), &name).is_err());
    }

    #[test]
    fn directory_file_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let id = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
        write_loose_ref(dir.path(), &RefName::branch("a").unwrap(), &id).unwrap();

        let nested = RefName::branch("a/b").unwrap();
        assert!(matches!(
            write_loose_ref(dir.path(), &nested, &id),
            Err(RefError::DirectoryConflict { .. })
        ));

        write_loose_ref(dir.path(), &RefName::branch("x/y").unwrap(), &id).unwrap();
        assert!(matches!(
            write_loose_ref(dir.path(), &RefName::branch("x").unwrap(), &id),
            Err(RefError::DirectoryConflict { .. })
        ));
    }

    #[test]
    fn enumerate_is_sorted_and_skips_locks() {
        let dir = tempfile::tempdir().unwrap();
        let id = oid("da39a3ee5e6b4b0d3255bfef95601890afd80709");
        for b in ["zeta", "alpha", "feature/x"] {
            write_loose_ref(dir.path(), &RefName::branch(b).unwrap(), &id).unwrap();
        }
        fs::write(dir.path().join("refs/heads/main.lock"), b"").unwrap();

        let names: Vec<String> = enumerate_loose_refs(dir.path(), "refs/heads")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            names,
            ["refs/heads/alpha", "refs/heads/feature/x", "refs/heads/zeta"]
        );
    }
}
