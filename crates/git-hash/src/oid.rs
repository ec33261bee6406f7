use std::fmt;
use std::str::FromStr;

use crate::HashError;

/// Length of a raw SHA-1 digest.
pub(crate) const RAW_LEN: usize = 20;
/// Length of a hex-encoded SHA-1 digest.
pub(crate) const HEX_LEN: usize = 40;

/// The name of a stored object: the SHA-1 of its header and content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; RAW_LEN]);

impl ObjectId {
    /// The all-zero id. Used as the placeholder for unreadable files when
    /// tree building is asked to substitute instead of failing.
    pub const NULL: Self = Self([0u8; RAW_LEN]);

    /// Wrap a raw 20-byte digest.
    pub const fn new(bytes: [u8; RAW_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an ObjectId from a raw digest slice, as found in tree
    /// entries and ref-delta pack entries.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        let arr: [u8; RAW_LEN] = bytes
            .try_into()
            .map_err(|_| HashError::InvalidHashLength {
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Parse a 40 character hex string. Upper and lower case are accepted.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        if hex.len() != HEX_LEN {
            return Err(HashError::InvalidHexLength { actual: hex.len() });
        }
        let mut bytes = [0u8; RAW_LEN];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| HashError::InvalidHex {
            input: hex.to_owned(),
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes of the hash.
    pub fn as_bytes(&self) -> &[u8; RAW_LEN] {
        &self.0
    }

    /// Check if this is the null (all-zeros) OID.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Fan-out directory and file name: `("xx", "38 more hex chars")`.
    pub fn loose_parts(&self) -> (String, String) {
        let hex = self.to_hex();
        let (dir, file) = hex.split_at(2);
        (dir.to_owned(), file.to_owned())
    }

    /// The loose object path component: `"xx/xxxx..."`.
    pub fn loose_path(&self) -> String {
        let (dir, file) = self.loose_parts();
        format!("{dir}/{file}")
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
