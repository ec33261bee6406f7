use std::fs;
use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::{header, Commit, ObjectType, RawObject, Tree};

use crate::{ObjectStore, OdbError};

/// Largest header we are willing to scan for its NUL.
const MAX_HEADER_LEN: usize = 64;

impl ObjectStore {
    /// Read an object.
    ///
    /// Fails with [`OdbError::NotFound`] if no file exists for `oid`, and
    /// with a decode error if the file does not inflate to a well-formed
    /// stored object whose declared length matches its content.
    pub fn read(&self, oid: &ObjectId) -> Result<RawObject, OdbError> {
        let stored = self.inflate_file(oid)?;
        Ok(RawObject::parse(&stored)?)
    }

    /// Read the kind and declared size without inflating the content.
    pub fn read_header(&self, oid: &ObjectId) -> Result<(ObjectType, usize), OdbError> {
        let compressed = self.read_file(oid)?;
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut buf = [0u8; MAX_HEADER_LEN];
        let mut filled = 0;

        while !buf[..filled].contains(&0) {
            if filled == buf.len() {
                return Err(OdbError::Corrupt {
                    oid: *oid,
                    reason: format!("header exceeds {MAX_HEADER_LEN} bytes"),
                });
            }
            let n = decoder
                .read(&mut buf[filled..])
                .map_err(|source| OdbError::Decompress { oid: *oid, source })?;
            if n == 0 {
                return Err(OdbError::Corrupt {
                    oid: *oid,
                    reason: "unexpected EOF before header terminator".into(),
                });
            }
            filled += n;
        }

        let (kind, size, _) = header::parse_header(&buf[..filled])?;
        Ok((kind, size))
    }

    /// Read an object and check that its content hashes back to `oid`.
    pub fn read_verified(&self, oid: &ObjectId) -> Result<RawObject, OdbError> {
        let stored = self.inflate_file(oid)?;
        let actual = Hasher::digest(&stored)?;
        if actual != *oid {
            return Err(OdbError::HashMismatch {
                path: self.object_path(oid),
                expected: *oid,
                actual,
            });
        }
        Ok(RawObject::parse(&stored)?)
    }

    /// Read and parse a tree.
    pub fn read_tree(&self, oid: &ObjectId) -> Result<Tree, OdbError> {
        let obj = self.read_kind(oid, ObjectType::Tree)?;
        Ok(Tree::parse(&obj.data)?)
    }

    /// Read and parse a commit.
    pub fn read_commit(&self, oid: &ObjectId) -> Result<Commit, OdbError> {
        let obj = self.read_kind(oid, ObjectType::Commit)?;
        Ok(Commit::parse(&obj.data)?)
    }

    fn read_kind(&self, oid: &ObjectId, expected: ObjectType) -> Result<RawObject, OdbError> {
        let obj = self.read(oid)?;
        if obj.kind != expected {
            return Err(OdbError::UnexpectedKind {
                oid: *oid,
                expected,
                actual: obj.kind,
            });
        }
        Ok(obj)
    }

    fn read_file(&self, oid: &ObjectId) -> Result<Vec<u8>, OdbError> {
        match fs::read(self.object_path(oid)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(OdbError::NotFound(*oid)),
            Err(e) => Err(OdbError::Io(e)),
        }
    }

    fn inflate_file(&self, oid: &ObjectId) -> Result<Vec<u8>, OdbError> {
        let compressed = self.read_file(oid)?;
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut stored = Vec::with_capacity(compressed.len() * 2);
        decoder
            .read_to_end(&mut stored)
            .map_err(|source| OdbError::Decompress { oid: *oid, source })?;
        Ok(stored)
    }
}
