//! Delta decoding.
//!
//! A delta rebuilds a target object from a base object:
//!
//! ```text
//! [base_size: varint] [target_size: varint] [op]*
//! ```
//!
//! Ops:
//! - Copy:   `[1SSSOOOO] [offset bytes] [size bytes]`, little-endian,
//!   each byte present only if its bit is set. A size of 0 means 0x10000.
//! - Insert: `[0NNNNNNN] [N literal bytes]`, N in 1..=127.
//!
//! The size varints here are plain little-endian base-128 and are unrelated
//! to the pack entry header encoding in [`crate::entry`].

pub mod apply;

pub use apply::apply_delta;

use crate::PackError;

/// Copy size used when no size byte is present.
pub const DEFAULT_COPY_SIZE: usize = 0x10000;

/// One delta op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOp<'a> {
    /// Append `base[offset..offset + size]`.
    Copy { offset: usize, size: usize },
    /// Append these literal bytes.
    Insert(&'a [u8]),
}

/// Read one delta size varint. Returns `(value, bytes_consumed)`.
pub fn read_size_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        if shift > 63 {
            return None;
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// A delta with its two size fields decoded and its ops still encoded.
#[derive(Debug, Clone, Copy)]
pub struct Delta<'a> {
    pub base_size: u64,
    pub target_size: u64,
    ops: &'a [u8],
    ops_start: usize,
}

impl<'a> Delta<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, PackError> {
        let (base_size, n1) = read_size_varint(data).ok_or_else(|| PackError::InvalidDelta {
            offset: 0,
            reason: "truncated base size".into(),
        })?;
        let (target_size, n2) =
            read_size_varint(&data[n1..]).ok_or_else(|| PackError::InvalidDelta {
                offset: n1,
                reason: "truncated target size".into(),
            })?;
        let ops_start = n1 + n2;
        Ok(Self {
            base_size,
            target_size,
            ops: &data[ops_start..],
            ops_start,
        })
    }

    /// Iterate over the ops, left to right.
    pub fn ops(&self) -> Ops<'a> {
        Ops {
            data: self.ops,
            pos: 0,
            base_offset: self.ops_start,
            failed: false,
        }
    }
}

/// Iterator over encoded delta ops. Stops after the first error.
pub struct Ops<'a> {
    data: &'a [u8],
    pos: usize,
    base_offset: usize,
    failed: bool,
}

impl<'a> Ops<'a> {
    fn error(&mut self, reason: &str) -> PackError {
        self.failed = true;
        PackError::InvalidDelta {
            offset: self.base_offset + self.pos,
            reason: reason.into(),
        }
    }

    /// Assemble a little-endian field of up to `width` bytes. Opcode bit
    /// `first_bit + i` says whether byte `i` is present.
    fn read_field(&mut self, cmd: u8, first_bit: u32, width: u32) -> Result<usize, PackError> {
        let mut value = 0usize;
        for i in 0..width {
            if cmd & (1 << (first_bit + i)) != 0 {
                let byte = match self.data.get(self.pos) {
                    Some(&b) => b,
                    None => return Err(self.error("truncated copy op")),
                };
                self.pos += 1;
                value |= usize::from(byte) << (8 * i);
            }
        }
        Ok(value)
    }

    fn next_op(&mut self, cmd: u8) -> Result<DeltaOp<'a>, PackError> {
        if cmd & 0x80 != 0 {
            let offset = self.read_field(cmd, 0, 4)?;
            let size = match self.read_field(cmd, 4, 3)? {
                0 => DEFAULT_COPY_SIZE,
                n => n,
            };
            Ok(DeltaOp::Copy { offset, size })
        } else if cmd != 0 {
            let n = usize::from(cmd);
            let end = self.pos + n;
            if end > self.data.len() {
                return Err(self.error("truncated insert data"));
            }
            let bytes = &self.data[self.pos..end];
            self.pos = end;
            Ok(DeltaOp::Insert(bytes))
        } else {
            self.pos -= 1;
            Err(self.error("reserved delta opcode 0"))
        }
    }
}

impl<'a> Iterator for Ops<'a> {
    type Item = Result<DeltaOp<'a>, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let cmd = self.data[self.pos];
        self.pos += 1;
        Some(self.next_op(cmd))
    }
}

/// Encode a delta size varint.
pub fn write_size_varint(mut value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
    buf
}

/// Encode a copy op. Offsets above `u32::MAX` and sizes above `0xFFFFFF`
/// cannot be represented and are truncated to their low bytes.
pub fn encode_copy(offset: u32, size: u32) -> Vec<u8> {
    let mut cmd: u8 = 0x80;
    let mut extra = Vec::with_capacity(7);

    for (i, byte) in offset.to_le_bytes().into_iter().enumerate() {
        if byte != 0 {
            cmd |= 1 << i;
            extra.push(byte);
        }
    }

    let size = if size as usize == DEFAULT_COPY_SIZE { 0 } else { size };
    for (i, byte) in size.to_le_bytes().into_iter().take(3).enumerate() {
        if byte != 0 {
            cmd |= 1 << (4 + i);
            extra.push(byte);
        }
    }

    let mut buf = Vec::with_capacity(1 + extra.len());
    buf.push(cmd);
    buf.extend_from_slice(&extra);
    buf
}

/// Encode insert ops for `data`, split into runs of at most 127 bytes.
pub fn encode_insert(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + data.len() / 127 + 1);
    for chunk in data.chunks(127) {
        buf.push(chunk.len() as u8);
        buf.extend_from_slice(chunk);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_varint_is_base128_from_bit_zero() {
        assert_eq!(read_size_varint(&[0x13]), Some((19, 1)));
        assert_eq!(read_size_varint(&[0x80, 0x01]), Some((128, 2)));
        assert_eq!(read_size_varint(&[0xE5, 0x8E, 0x26]), Some((624_485, 3)));
        assert_eq!(read_size_varint(&[0x80]), None);
        assert_eq!(read_size_varint(&[]), None);
    }

    #[test]
    fn size_varint_roundtrip() {
        for value in [0u64, 1, 127, 128, 255, 16383, 16384, 1_000_000, u64::MAX] {
            let encoded = write_size_varint(value);
            assert_eq!(read_size_varint(&encoded), Some((value, encoded.len())));
        }
    }

    #[test]
    fn parse_ops() {
        let mut data = write_size_varint(100);
        data.extend(write_size_varint(50));
        data.extend(encode_copy(5, 10));
        data.extend(encode_insert(&[0xAA, 0xBB, 0xCC]));

        let delta = Delta::parse(&data).unwrap();
        assert_eq!(delta.base_size, 100);
        assert_eq!(delta.target_size, 50);
        let ops: Vec<_> = delta.ops().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            ops,
            vec![
                DeltaOp::Copy { offset: 5, size: 10 },
                DeltaOp::Insert(&[0xAA, 0xBB, 0xCC]),
            ]
        );
    }

    #[test]
    fn copy_fields_are_little_endian_and_sparse() {
        // Offset bytes 1 and 3 present, size byte 1 present.
        let data = [0x00, 0x00, 0x80 | 0x02 | 0x08 | 0x20, 0x12, 0x34, 0x01];
        let delta = Delta::parse(&data).unwrap();
        let op = delta.ops().next().unwrap().unwrap();
        assert_eq!(
            op,
            DeltaOp::Copy {
                offset: 0x3400_1200,
                size: 0x0100,
            }
        );
    }

    #[test]
    fn copy_without_size_bytes_means_64k() {
        let data = [0x00, 0x00, 0x80 | 0x01, 0x07];
        let delta = Delta::parse(&data).unwrap();
        assert_eq!(
            delta.ops().next().unwrap().unwrap(),
            DeltaOp::Copy {
                offset: 7,
                size: DEFAULT_COPY_SIZE,
            }
        );
        assert_eq!(encode_copy(0, 0x10000), vec![0x80]);
    }

    #[test]
    fn bare_copy_opcode_is_offset_zero() {
        let data = [0x00, 0x00, 0x80];
        let delta = Delta::parse(&data).unwrap();
        assert_eq!(
            delta.ops().next().unwrap().unwrap(),
            DeltaOp::Copy {
                offset: 0,
                size: DEFAULT_COPY_SIZE,
            }
        );
    }

    #[test]
    fn opcode_zero_is_error() {
        let data = [0x0A, 0x0A, 0x00];
        let delta = Delta::parse(&data).unwrap();
        let mut ops = delta.ops();
        assert!(matches!(
            ops.next(),
            Some(Err(PackError::InvalidDelta { offset: 2, .. }))
        ));
        assert!(ops.next().is_none());
    }

    #[test]
    fn truncated_ops_are_errors() {
        let truncated_copy = [0x00, 0x00, 0x80 | 0x01 | 0x10, 0x05];
        assert!(Delta::parse(&truncated_copy)
            .unwrap()
            .ops()
            .any(|op| op.is_err()));

        let truncated_insert = [0x00, 0x05, 0x05, b'a', b'b'];
        assert!(Delta::parse(&truncated_insert)
            .unwrap()
            .ops()
            .any(|op| op.is_err()));
    }

    #[test]
    fn long_insert_is_split() {
        let data = vec![b'x'; 300];
        let encoded = encode_insert(&data);
        assert_eq!(encoded.len(), 303);
        assert_eq!(encoded[0], 127);
        assert_eq!(encoded[128], 127);
        assert_eq!(encoded[256], 46);
    }
}
