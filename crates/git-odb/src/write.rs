use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use git_hash::ObjectId;
use git_object::{ObjectType, RawObject};
use tempfile::NamedTempFile;
use tracing::trace;

use crate::{ObjectStore, OdbError};

impl ObjectStore {
    /// Store `content` as an object of `kind` and return its id.
    ///
    /// No-op if the object already exists. The file is written to a
    /// temporary name in its fan-out directory and renamed into place.
    pub fn write(&self, kind: ObjectType, content: &[u8]) -> Result<ObjectId, OdbError> {
        self.write_raw(&RawObject::new(kind, content))
    }

    pub fn write_raw(&self, obj: &RawObject) -> Result<ObjectId, OdbError> {
        let oid = obj.id()?;
        if self.contains(&oid) {
            trace!(%oid, "object already stored");
            return Ok(oid);
        }

        let final_path = self.object_path(&oid);
        let dir = final_path
            .parent()
            .unwrap_or_else(|| self.objects_dir.as_path());
        fs::create_dir_all(dir)?;

        let tmp = self.write_temp(dir, &obj.serialize())?;
        persist(tmp, &final_path)?;
        trace!(%oid, kind = %obj.kind, size = obj.data.len(), "wrote object");
        Ok(oid)
    }

    fn write_temp(&self, dir: &Path, stored: &[u8]) -> Result<NamedTempFile, OdbError> {
        let tmp = tempfile::Builder::new().prefix("tmp_obj_").tempfile_in(dir)?;
        let mut encoder = ZlibEncoder::new(tmp, self.compression);
        encoder.write_all(stored)?;
        let tmp = encoder.finish()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o444))?;
        }

        Ok(tmp)
    }
}

/// Move a finished temp file to its final name. Losing a race against
/// another writer of the same object is success: the content is identical.
fn persist(tmp: NamedTempFile, final_path: &Path) -> Result<(), OdbError> {
    match tmp.persist(final_path) {
        Ok(_) => Ok(()),
        Err(_) if final_path.is_file() => Ok(()),
        Err(e) => Err(OdbError::Io(e.error)),
    }
}
