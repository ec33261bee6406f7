use flate2::{Decompress, FlushDecompress, Status};
use git_hash::ObjectId;
use git_object::ObjectType;
use tracing::{debug, trace, warn};

use crate::entry::parse_entry_header;
use crate::verify::verify_trailer;
use crate::{PackEntryType, PackError, PACK_TRAILER_SIZE, PACK_VERSION};

const INFLATE_CHUNK: usize = 8 * 1024;
const RAW_OID_LEN: usize = 20;
/// Cap on the capacity reserved from a declared entry size.
const MAX_PREALLOC: u64 = 16 << 20;

/// A read position over pack bytes.
///
/// Entries are laid out back to back with no length prefix, so every read
/// advances the cursor by exactly what it consumed, including the
/// compressed bytes the inflater took.
#[derive(Debug, Clone)]
pub struct PackCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PackCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Everything consumed so far.
    pub fn consumed(&self) -> &'a [u8] {
        &self.data[..self.pos]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Take exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], PackError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| PackError::CorruptEntry {
                offset: self.pos,
                reason: format!("need {n} bytes, {} left", self.data.len() - self.pos),
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, PackError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Inflate one zlib stream starting at the cursor and advance past the
    /// compressed bytes it used. Whatever follows belongs to the next entry.
    pub fn inflate(&mut self, size_hint: u64) -> Result<Vec<u8>, PackError> {
        let start = self.pos;
        let input = self.remaining();
        let mut inflater = Decompress::new(true);
        let mut out = Vec::with_capacity(size_hint.min(MAX_PREALLOC) as usize);

        loop {
            let consumed = inflater.total_in() as usize;
            let produced = out.len();
            if out.capacity() - out.len() < INFLATE_CHUNK {
                out.reserve(INFLATE_CHUNK);
            }

            let status = inflater
                .decompress_vec(&input[consumed..], &mut out, FlushDecompress::None)
                .map_err(|e| PackError::Decompress {
                    offset: start,
                    reason: e.to_string(),
                })?;

            if status == Status::StreamEnd {
                break;
            }
            let progressed = inflater.total_in() as usize != consumed || out.len() != produced;
            if !progressed {
                return Err(PackError::Decompress {
                    offset: start,
                    reason: "zlib stream truncated".into(),
                });
            }
        }

        self.pos += inflater.total_in() as usize;
        trace!(
            offset = start,
            compressed = self.pos - start,
            inflated = out.len(),
            "inflated pack entry"
        );
        Ok(out)
    }
}

/// What a pack entry carries once its zlib stream is inflated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPayload {
    /// A complete object.
    Object { kind: ObjectType, data: Vec<u8> },
    /// Delta ops to apply to the object named `base`.
    RefDelta { base: ObjectId, delta: Vec<u8> },
}

/// One entry of a pack stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    /// Offset of the entry header within the stream input.
    pub offset: usize,
    /// Size from the entry header. Advisory.
    pub declared_size: u64,
    pub payload: EntryPayload,
}

/// Result of checking the bytes after the last entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailer {
    /// A 20-byte checksum was present and matched.
    Verified(ObjectId),
    /// The stream ended right after the last entry.
    Absent,
}

/// Iterator over the entries of a pack stream.
///
/// Input starts at the 4-byte big-endian object count (signature and
/// version already stripped). Iteration stops after the declared number of
/// entries or at the first error; errors are not recoverable because the
/// position of the next entry is unknown.
pub struct PackStream<'a> {
    cursor: PackCursor<'a>,
    version: u32,
    object_count: u32,
    remaining: u32,
    failed: bool,
}

impl<'a> PackStream<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, PackError> {
        let mut cursor = PackCursor::new(data);
        let object_count = cursor.read_u32_be().map_err(|_| {
            PackError::InvalidHeader(format!("missing object count ({} bytes)", data.len()))
        })?;
        debug!(object_count, bytes = data.len(), "reading pack stream");
        Ok(Self {
            cursor,
            version: PACK_VERSION,
            object_count,
            remaining: object_count,
            failed: false,
        })
    }

    /// Record the version from the stripped pack prefix. It is only needed
    /// to recompute the trailer checksum.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn object_count(&self) -> u32 {
        self.object_count
    }

    /// Verify the trailer after all entries have been read.
    ///
    /// The checksum covers the 8-byte prefix as well, which is rebuilt
    /// from the version.
    pub fn finish(self) -> Result<Trailer, PackError> {
        if self.remaining != 0 {
            return Err(PackError::CorruptEntry {
                offset: self.cursor.position(),
                reason: format!("{} entries were not read", self.remaining),
            });
        }
        let rest = self.cursor.remaining();
        if rest.is_empty() {
            debug!("pack stream has no trailer");
            return Ok(Trailer::Absent);
        }
        if rest.len() < PACK_TRAILER_SIZE {
            return Err(PackError::InvalidHeader(format!(
                "truncated pack trailer: {} bytes",
                rest.len()
            )));
        }
        if rest.len() > PACK_TRAILER_SIZE {
            warn!(
                extra = rest.len() - PACK_TRAILER_SIZE,
                "ignoring bytes after pack trailer"
            );
        }
        let checksum = verify_trailer(
            self.version,
            self.cursor.consumed(),
            &rest[..PACK_TRAILER_SIZE],
        )?;
        Ok(Trailer::Verified(checksum))
    }

    fn read_entry(&mut self) -> Result<PackEntry, PackError> {
        let offset = self.cursor.position();
        let header = parse_entry_header(self.cursor.remaining(), offset)?;
        self.cursor.take(header.header_len)?;

        let payload = match header.entry_type {
            PackEntryType::RefDelta => {
                let base = ObjectId::from_bytes(self.cursor.take(RAW_OID_LEN)?)?;
                let delta = self.cursor.inflate(header.size)?;
                EntryPayload::RefDelta { base, delta }
            }
            PackEntryType::OfsDelta => {
                return Err(PackError::Unsupported {
                    type_name: PackEntryType::OfsDelta.name(),
                    offset,
                })
            }
            direct => {
                let kind = direct.to_object_type().ok_or(PackError::Unsupported {
                    type_name: direct.name(),
                    offset,
                })?;
                let data = self.cursor.inflate(header.size)?;
                EntryPayload::Object { kind, data }
            }
        };

        Ok(PackEntry {
            offset,
            declared_size: header.size,
            payload,
        })
    }
}

impl Iterator for PackStream<'_> {
    type Item = Result<PackEntry, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        let entry = self.read_entry();
        match entry {
            Ok(_) => self.remaining -= 1,
            Err(_) => self.failed = true,
        }
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining as usize))
        }
    }
}
