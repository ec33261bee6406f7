//! Sideband demultiplexing.
//!
//! Inside the `packfile` section every pkt-line payload starts with a
//! channel byte:
//! - 1: pack data
//! - 2: progress text, logged at debug level
//! - 3: fatal error text from the remote

use std::io::{Read, Write};

use tracing::debug;

use crate::pktline::{strip_newline, PktLine, PktLineReader, PktLineWriter, MAX_PKT_DATA_LEN};
use crate::ProtocolError;

/// Sideband channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Data = 1,
    Progress = 2,
    Error = 3,
}

pub struct SidebandReader<R> {
    reader: PktLineReader<R>,
}

impl<R: Read> SidebandReader<R> {
    pub fn new(reader: PktLineReader<R>) -> Self {
        Self { reader }
    }

    /// Next chunk of band-1 data, or `None` at the end of the section
    /// (any control packet, or end of input).
    ///
    /// Band 3 messages and `ERR` packets end the read with
    /// [`ProtocolError::ServerError`].
    pub fn read_data(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        loop {
            let data = match self.reader.read_pkt_or_eof()? {
                None | Some(PktLine::Flush | PktLine::Delimiter | PktLine::ResponseEnd) => {
                    return Ok(None)
                }
                Some(PktLine::Data(data)) => data,
            };

            if let Some(msg) = data.strip_prefix(b"ERR ") {
                return Err(server_error(msg));
            }
            let Some((&band, payload)) = data.split_first() else {
                return Err(ProtocolError::Protocol(
                    "empty packet in sideband stream".into(),
                ));
            };
            match band {
                1 => return Ok(Some(payload.to_vec())),
                2 => {
                    debug!(
                        progress = %String::from_utf8_lossy(payload).trim_end(),
                        "remote"
                    );
                }
                3 => return Err(server_error(payload)),
                other => {
                    return Err(ProtocolError::Protocol(format!(
                        "unknown sideband channel {other}"
                    )))
                }
            }
        }
    }

    /// Concatenate all band-1 data up to the end of the section.
    pub fn read_all_data(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut result = Vec::new();
        while let Some(chunk) = self.read_data()? {
            result.extend_from_slice(&chunk);
        }
        Ok(result)
    }
}

fn server_error(msg: &[u8]) -> ProtocolError {
    ProtocolError::ServerError(
        String::from_utf8_lossy(strip_newline(msg)).trim_end().to_string(),
    )
}

/// Write `data` on `band`, split into packets of the largest allowed size.
pub fn write_sideband_data<W: Write>(
    writer: &mut PktLineWriter<W>,
    band: Band,
    data: &[u8],
) -> Result<(), ProtocolError> {
    for chunk in data.chunks(MAX_PKT_DATA_LEN - 1) {
        let mut pkt = Vec::with_capacity(1 + chunk.len());
        pkt.push(band as u8);
        pkt.extend_from_slice(chunk);
        writer.write_line(&pkt)?;
    }
    Ok(())
}
