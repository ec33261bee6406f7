//! Ref discovery.
//!
//! `GET info/refs?service=git-upload-pack` without a `Git-Protocol` header
//! returns a protocol v0 advertisement:
//!
//! ```text
//! 001e# service=git-upload-pack\n
//! 0000
//! 00..<oid> HEAD\0<capabilities>\n
//! 00..<oid> refs/heads/main\n
//! 00..<oid> refs/tags/v1.0\n
//! 00..<oid> refs/tags/v1.0^{}\n
//! 0000
//! ```
//!
//! An empty repository sends a single `<zero-id> capabilities^{}` line
//! carrying the capabilities.

use bstr::{BStr, BString, ByteSlice};
use git_hash::ObjectId;
use git_transport::Transport;
use tracing::{debug, info};

use crate::capability::Capabilities;
use crate::pktline::{strip_newline, PktLine, PktLineReader};
use crate::ProtocolError;

/// One `<oid> <refname>` line of the advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedRef {
    pub name: BString,
    pub target: ObjectId,
}

impl AdvertisedRef {
    /// Branch name without `refs/heads/`, if this is a branch.
    pub fn branch_name(&self) -> Option<&BStr> {
        self.name.strip_prefix(b"refs/heads/").map(|b| b.as_bstr())
    }
}

/// Parsed ref advertisement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefAdvertisement {
    /// Commit `HEAD` points at; `None` for an empty repository or a
    /// remote that does not advertise `HEAD`.
    pub head: Option<ObjectId>,
    /// Every other advertised ref, in server order. Peeled tag lines
    /// (`^{}`) are not included.
    pub refs: Vec<AdvertisedRef>,
    pub capabilities: Capabilities,
}

impl RefAdvertisement {
    pub fn parse(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = PktLineReader::new(body);
        let mut adv = RefAdvertisement::default();
        let mut first = true;

        loop {
            let data = match reader.read_pkt()? {
                PktLine::Data(data) => data,
                PktLine::Flush if first => {
                    // Only the service header may precede a flush before
                    // any ref line; an empty advertisement is malformed.
                    return Err(ProtocolError::InvalidAdvertisement(
                        "advertisement has no ref lines".into(),
                    ));
                }
                PktLine::Flush => break,
                other => {
                    return Err(ProtocolError::InvalidAdvertisement(format!(
                        "unexpected {other:?} in ref advertisement"
                    )))
                }
            };
            let line = strip_newline(&data);

            if line.starts_with(b"#") {
                if !first {
                    return Err(ProtocolError::InvalidAdvertisement(
                        "service header after ref lines".into(),
                    ));
                }
                debug!(header = %line.as_bstr(), "service header");
                skip_to_flush(&mut reader)?;
                continue;
            }
            if line == b"version 2" {
                return Err(ProtocolError::InvalidAdvertisement(
                    "server answered with a protocol v2 capability advertisement".into(),
                ));
            }

            let line = if first {
                first = false;
                match line.find_byte(0) {
                    Some(nul) => {
                        let caps = std::str::from_utf8(&line[nul + 1..]).map_err(|_| {
                            ProtocolError::InvalidAdvertisement(
                                "capabilities are not UTF-8".into(),
                            )
                        })?;
                        adv.capabilities = Capabilities::parse(caps);
                        &line[..nul]
                    }
                    None => line,
                }
            } else {
                line
            };

            let (target, name) = parse_ref_line(line)?;
            if name == "capabilities^{}" {
                continue;
            }
            if name.ends_with(b"^{}") {
                continue;
            }
            if name == "HEAD" {
                adv.head = Some(target);
            } else {
                adv.refs.push(AdvertisedRef { name, target });
            }
        }

        Ok(adv)
    }

    /// Branch `HEAD` points at, from the `symref=HEAD:<ref>` capability.
    pub fn head_symref(&self) -> Option<&str> {
        self.capabilities.symref_target("HEAD")
    }

    /// Advertised `refs/heads/*` refs.
    pub fn branches(&self) -> impl Iterator<Item = &AdvertisedRef> {
        self.refs.iter().filter(|r| r.branch_name().is_some())
    }

    /// Distinct advertised ids, `HEAD` first, in advertisement order.
    pub fn wants(&self) -> Vec<ObjectId> {
        let mut wants: Vec<ObjectId> = Vec::new();
        for oid in self.head.iter().chain(self.refs.iter().map(|r| &r.target)) {
            if !wants.contains(oid) {
                wants.push(*oid);
            }
        }
        wants
    }

    /// True when the remote has no refs at all.
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.refs.is_empty()
    }
}

fn skip_to_flush(reader: &mut PktLineReader<&[u8]>) -> Result<(), ProtocolError> {
    loop {
        match reader.read_pkt()? {
            PktLine::Flush => return Ok(()),
            PktLine::Data(_) => {}
            other => {
                return Err(ProtocolError::InvalidAdvertisement(format!(
                    "unexpected {other:?} after service header"
                )))
            }
        }
    }
}

fn parse_ref_line(line: &[u8]) -> Result<(ObjectId, BString), ProtocolError> {
    let invalid = || {
        ProtocolError::InvalidAdvertisement(format!("malformed ref line: {:?}", line.as_bstr()))
    };
    let (hex, name) = line.split_once_str(b" ").ok_or_else(invalid)?;
    let hex = std::str::from_utf8(hex).map_err(|_| invalid())?;
    let target = ObjectId::from_hex(hex).map_err(|_| invalid())?;
    if name.is_empty() {
        return Err(invalid());
    }
    Ok((target, BString::from(name)))
}

/// Ask the remote for its refs.
pub fn discover<T: Transport + ?Sized>(transport: &T) -> Result<RefAdvertisement, ProtocolError> {
    let body = transport.advertised_refs()?;
    let adv = RefAdvertisement::parse(&body)?;
    info!(
        refs = adv.refs.len(),
        head = ?adv.head,
        head_symref = adv.head_symref(),
        "discovered refs"
    );
    Ok(adv)
}
