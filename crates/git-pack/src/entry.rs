//! Pack entry header decoding.
//!
//! The entry header is its own varint: the first byte carries a
//! continuation bit, a 3-bit type and the low 4 size bits; every
//! following byte adds 7 more size bits. This is NOT the delta size
//! varint in [`crate::delta`], which has no type field and starts at
//! shift 0.

use crate::{PackEntryType, PackError};

/// A decoded entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub entry_type: PackEntryType,
    /// Inflated size as declared by the header. Advisory only: the real
    /// extent of an entry is wherever its zlib stream ends.
    pub size: u64,
    /// Number of bytes the header occupied.
    pub header_len: usize,
}

/// Decode the entry header at the start of `data`.
///
/// `offset` is only used for error reporting.
pub fn parse_entry_header(data: &[u8], offset: usize) -> Result<EntryHeader, PackError> {
    let first = *data.first().ok_or_else(|| PackError::CorruptEntry {
        offset,
        reason: "missing entry header".into(),
    })?;

    let type_num = (first >> 4) & 0x07;
    let mut size = u64::from(first & 0x0f);
    let mut shift = 4u32;
    let mut pos = 1;
    let mut byte = first;

    while byte & 0x80 != 0 {
        byte = *data.get(pos).ok_or_else(|| PackError::CorruptEntry {
            offset,
            reason: "truncated entry header".into(),
        })?;
        pos += 1;
        if shift > 57 {
            return Err(PackError::CorruptEntry {
                offset,
                reason: "entry size overflows 64 bits".into(),
            });
        }
        size |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }

    let entry_type =
        PackEntryType::from_type_number(type_num).ok_or(PackError::Unsupported {
            type_name: "unknown",
            offset,
        })?;

    Ok(EntryHeader {
        entry_type,
        size,
        header_len: pos,
    })
}

/// Encode an entry header. Used to build packs in tests and fixtures.
pub fn encode_entry_header(entry_type: PackEntryType, size: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    let mut s = size;

    let mut c = (entry_type.type_number() << 4) | (s & 0x0f) as u8;
    s >>= 4;

    while s > 0 {
        buf.push(c | 0x80);
        c = (s & 0x7f) as u8;
        s >>= 7;
    }
    buf.push(c);
    buf
}
