//! Protocol v2 `fetch`.
//!
//! The request names every wanted id and says `done` straight away: a
//! clone has nothing to negotiate. The response may open with sections
//! such as `acknowledgments` or `shallow-info`; the pack follows the
//! `packfile` line, sideband-multiplexed, up to a flush.

use bstr::ByteSlice;
use git_hash::ObjectId;
use git_pack::{parse_pack_prefix, PackError, PackStream, PACK_PREFIX_SIZE};
use git_transport::Transport;
use tracing::{debug, info};

use crate::pktline::{strip_newline, PktLine, PktLineReader, PktLineWriter};
use crate::sideband::SidebandReader;
use crate::ProtocolError;

/// Pack received from a fetch, with the 8-byte `PACK`/version prefix
/// validated and removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackData {
    pub version: u32,
    /// Object count, entries and trailer.
    pub data: Vec<u8>,
}

impl PackData {
    /// Iterate the entries of this pack.
    pub fn stream(&self) -> Result<PackStream<'_>, PackError> {
        Ok(PackStream::new(&self.data)?.with_version(self.version))
    }
}

/// Encode a `command=fetch` request for `wants`.
///
/// Duplicate ids are sent once. Progress is switched off and `ofs-delta`
/// is not offered, so the server answers with full objects and ref-deltas
/// only.
pub fn build_fetch_request(wants: &[ObjectId], agent: &str) -> Result<Vec<u8>, ProtocolError> {
    if wants.is_empty() {
        return Err(ProtocolError::Protocol("fetch request without wants".into()));
    }

    let mut buf = Vec::new();
    let mut w = PktLineWriter::new(&mut buf);
    w.write_text("command=fetch")?;
    w.write_text(&format!("agent={agent}"))?;
    w.write_delimiter()?;
    w.write_text("no-progress")?;
    let mut sent: Vec<&ObjectId> = Vec::with_capacity(wants.len());
    for oid in wants {
        if sent.contains(&oid) {
            continue;
        }
        w.write_text(&format!("want {oid}"))?;
        sent.push(oid);
    }
    w.write_text("done")?;
    w.write_flush()?;
    Ok(buf)
}

/// Extract the pack from a fetch response body.
///
/// A v0 style answer (`NAK` followed directly by sideband data) is
/// accepted as well.
pub fn parse_fetch_response(body: &[u8]) -> Result<PackData, ProtocolError> {
    let mut reader = PktLineReader::new(body);

    loop {
        let data = match reader.read_pkt_or_eof()? {
            Some(PktLine::Data(data)) => data,
            Some(PktLine::Delimiter) => continue,
            Some(PktLine::Flush | PktLine::ResponseEnd) | None => {
                return Err(ProtocolError::Protocol(
                    "fetch response has no packfile section".into(),
                ))
            }
        };
        let line = strip_newline(&data);
        if let Some(msg) = line.strip_prefix(b"ERR ") {
            return Err(ProtocolError::ServerError(msg.to_str_lossy().into_owned()));
        }
        match line {
            b"packfile" | b"NAK" => break,
            _ => debug!(line = %line.as_bstr(), "skipping fetch response line"),
        }
    }

    let pack = SidebandReader::new(reader).read_all_data()?;
    let version = parse_pack_prefix(&pack)?;
    info!(version, bytes = pack.len(), "received pack");
    Ok(PackData {
        version,
        data: pack[PACK_PREFIX_SIZE..].to_vec(),
    })
}

/// Request `wants` from the remote and return the received pack.
pub fn fetch_pack<T: Transport + ?Sized>(
    transport: &T,
    wants: &[ObjectId],
    agent: &str,
) -> Result<PackData, ProtocolError> {
    let request = build_fetch_request(wants, agent)?;
    info!(wants = wants.len(), "fetching pack");
    let body = transport.upload_pack(&request)?;
    parse_fetch_response(&body)
}
