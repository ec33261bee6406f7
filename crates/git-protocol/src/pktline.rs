//! Pkt-line framing.
//!
//! Every packet starts with four hex digits giving its total length,
//! the four length bytes included. Lengths below 4 are control packets:
//! - `0000`: flush (end of a section or message)
//! - `0001`: delimiter (separates sections of a v2 request or response)
//! - `0002`: response end (v2, stateless connections)

use std::io::{ErrorKind, Read, Write};

use crate::ProtocolError;

/// Largest payload a single packet can carry.
pub const MAX_PKT_DATA_LEN: usize = 65516;

/// Largest packet, header included.
pub const MAX_PKT_LEN: usize = MAX_PKT_DATA_LEN + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Data(Vec<u8>),
    Flush,
    Delimiter,
    ResponseEnd,
}

/// Reads packets from any byte source; `&[u8]` works for buffered bodies.
pub struct PktLineReader<R> {
    reader: R,
}

impl<R: Read> PktLineReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read one packet. End of input is an error.
    pub fn read_pkt(&mut self) -> Result<PktLine, ProtocolError> {
        self.read_pkt_or_eof()?.ok_or_else(|| {
            ProtocolError::InvalidPktLine("unexpected end of input, expected a pkt-line".into())
        })
    }

    /// Read one packet, or `None` when the input ends cleanly on a packet
    /// boundary.
    pub fn read_pkt_or_eof(&mut self) -> Result<Option<PktLine>, ProtocolError> {
        let mut len_buf = [0u8; 4];
        let mut filled = 0;
        while filled < len_buf.len() {
            match self.reader.read(&mut len_buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(ProtocolError::InvalidPktLine(format!(
                        "truncated pkt-line length: {:?}",
                        String::from_utf8_lossy(&len_buf[..filled])
                    )))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let len = parse_length(&len_buf)?;
        let pkt = match len {
            0 => PktLine::Flush,
            1 => PktLine::Delimiter,
            2 => PktLine::ResponseEnd,
            3 => {
                return Err(ProtocolError::InvalidPktLine(
                    "pkt-line length 3 is reserved".into(),
                ))
            }
            _ => {
                let data_len = len - 4;
                if data_len > MAX_PKT_DATA_LEN {
                    return Err(ProtocolError::InvalidPktLine(format!(
                        "pkt-line too long: {data_len} bytes"
                    )));
                }
                let mut data = vec![0u8; data_len];
                self.reader.read_exact(&mut data).map_err(|e| {
                    if e.kind() == ErrorKind::UnexpectedEof {
                        ProtocolError::InvalidPktLine(format!(
                            "pkt-line payload truncated (expected {data_len} bytes)"
                        ))
                    } else {
                        ProtocolError::Io(e)
                    }
                })?;
                PktLine::Data(data)
            }
        };
        Ok(Some(pkt))
    }

    /// Read data packets up to the next control packet.
    pub fn read_until_flush(&mut self) -> Result<Vec<Vec<u8>>, ProtocolError> {
        let mut lines = Vec::new();
        while let PktLine::Data(data) = self.read_pkt()? {
            lines.push(data);
        }
        Ok(lines)
    }
}

fn parse_length(buf: &[u8; 4]) -> Result<usize, ProtocolError> {
    let invalid = || {
        ProtocolError::InvalidPktLine(format!(
            "invalid pkt-line length: {:?}",
            String::from_utf8_lossy(buf)
        ))
    };
    let s = std::str::from_utf8(buf).map_err(|_| invalid())?;
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    usize::from_str_radix(s, 16).map_err(|_| invalid())
}

pub struct PktLineWriter<W> {
    writer: W,
}

impl<W: Write> PktLineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a data packet.
    pub fn write_line(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        if data.len() > MAX_PKT_DATA_LEN {
            return Err(ProtocolError::InvalidPktLine(format!(
                "data too long for pkt-line: {} bytes (max {MAX_PKT_DATA_LEN})",
                data.len()
            )));
        }
        write!(self.writer, "{:04x}", data.len() + 4)?;
        self.writer.write_all(data)?;
        Ok(())
    }

    /// Write a text packet, adding the trailing `\n` if missing.
    pub fn write_text(&mut self, text: &str) -> Result<(), ProtocolError> {
        if text.ends_with('\n') {
            self.write_line(text.as_bytes())
        } else {
            let mut data = Vec::with_capacity(text.len() + 1);
            data.extend_from_slice(text.as_bytes());
            data.push(b'\n');
            self.write_line(&data)
        }
    }

    pub fn write_flush(&mut self) -> Result<(), ProtocolError> {
        self.writer.write_all(b"0000")?;
        Ok(())
    }

    pub fn write_delimiter(&mut self) -> Result<(), ProtocolError> {
        self.writer.write_all(b"0001")?;
        Ok(())
    }

    pub fn write_response_end(&mut self) -> Result<(), ProtocolError> {
        self.writer.write_all(b"0002")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Strip one trailing `\n`.
pub fn strip_newline(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\n").unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl FnOnce(&mut PktLineWriter<&mut Vec<u8>>)) -> Vec<u8> {
        let mut buf = Vec::new();
        f(&mut PktLineWriter::new(&mut buf));
        buf
    }

    #[test]
    fn data_line() {
        let buf = encode(|w| w.write_line(b"hello").unwrap());
        assert_eq!(buf, b"0009hello");

        let mut reader = PktLineReader::new(&buf[..]);
        assert_eq!(reader.read_pkt().unwrap(), PktLine::Data(b"hello".to_vec()));
        assert_eq!(reader.read_pkt_or_eof().unwrap(), None);
    }

    #[test]
    fn text_line_gets_newline() {
        assert_eq!(encode(|w| w.write_text("hello").unwrap()), b"000ahello\n");
        assert_eq!(encode(|w| w.write_text("done\n").unwrap()), b"0009done\n");
    }

    #[test]
    fn control_packets() {
        let buf = encode(|w| {
            w.write_flush().unwrap();
            w.write_delimiter().unwrap();
            w.write_response_end().unwrap();
        });
        assert_eq!(buf, b"000000010002");

        let mut reader = PktLineReader::new(&buf[..]);
        assert_eq!(reader.read_pkt().unwrap(), PktLine::Flush);
        assert_eq!(reader.read_pkt().unwrap(), PktLine::Delimiter);
        assert_eq!(reader.read_pkt().unwrap(), PktLine::ResponseEnd);
    }

    #[test]
    fn sections() {
        let data = b"000ahello\n000bworld!\n00000008next0000";
        let mut reader = PktLineReader::new(&data[..]);
        assert_eq!(
            reader.read_until_flush().unwrap(),
            vec![b"hello\n".to_vec(), b"world!\n".to_vec()]
        );
        assert_eq!(reader.read_until_flush().unwrap(), vec![b"next".to_vec()]);
    }

    #[test]
    fn empty_data_line() {
        let mut reader = PktLineReader::new(&b"0004"[..]);
        assert_eq!(reader.read_pkt().unwrap(), PktLine::Data(Vec::new()));
    }

    #[test]
    fn uppercase_hex_length() {
        let data = b"000Ahello\n";
        let mut reader = PktLineReader::new(&data[..]);
        assert_eq!(reader.read_pkt().unwrap(), PktLine::Data(b"hello\n".to_vec()));
    }

    #[test]
    fn malformed_input() {
        for bad in [&b"0003"[..], b"00x9hello", b"+009hello", b"000", b"0009hel"] {
            let mut reader = PktLineReader::new(bad);
            assert!(
                matches!(reader.read_pkt(), Err(ProtocolError::InvalidPktLine(_))),
                "{:?}",
                String::from_utf8_lossy(bad)
            );
        }
        let mut reader = PktLineReader::new(&b""[..]);
        assert!(reader.read_pkt().is_err());
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        let mut buf = Vec::new();
        let mut writer = PktLineWriter::new(&mut buf);
        assert!(writer.write_line(&vec![0u8; MAX_PKT_DATA_LEN]).is_ok());
        assert!(writer.write_line(&vec![0u8; MAX_PKT_DATA_LEN + 1]).is_err());

        let mut reader = PktLineReader::new(&b"fff1"[..]);
        assert!(matches!(
            reader.read_pkt(),
            Err(ProtocolError::InvalidPktLine(_))
        ));
    }
}
