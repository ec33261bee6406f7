//! Pack checksum verification.

use git_hash::hasher::Hasher;
use git_hash::ObjectId;

use crate::{PackError, PACK_SIGNATURE, PACK_TRAILER_SIZE};

/// SHA-1 over the pack prefix (`PACK` + version) and `body`, where `body`
/// is everything from the object count to the end of the last entry.
pub fn pack_checksum(version: u32, body: &[u8]) -> Result<ObjectId, PackError> {
    let mut hasher = Hasher::new();
    hasher.update(PACK_SIGNATURE);
    hasher.update(&version.to_be_bytes());
    hasher.update(body);
    Ok(hasher.finalize()?)
}

/// Compare the 20-byte `trailer` with the checksum of the pack contents.
pub fn verify_trailer(version: u32, body: &[u8], trailer: &[u8]) -> Result<ObjectId, PackError> {
    if trailer.len() != PACK_TRAILER_SIZE {
        return Err(PackError::InvalidHeader(format!(
            "pack trailer must be {PACK_TRAILER_SIZE} bytes, got {}",
            trailer.len()
        )));
    }
    let expected = ObjectId::from_bytes(trailer)?;
    let actual = pack_checksum(version, body)?;
    if expected != actual {
        return Err(PackError::ChecksumMismatch { expected, actual });
    }
    Ok(actual)
}
