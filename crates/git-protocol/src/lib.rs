//! Client side of the git smart protocol.
//!
//! Discovery reads the protocol v0 ref advertisement returned by
//! `info/refs`; the pack itself is requested with a single protocol v2
//! `fetch` command. Both travel in pkt-line framing, and the pack data is
//! multiplexed over sideband channels.

pub mod capability;
pub mod discovery;
pub mod fetch;
pub mod pktline;
pub mod sideband;

pub use capability::Capabilities;
pub use discovery::{discover, AdvertisedRef, RefAdvertisement};
pub use fetch::{build_fetch_request, fetch_pack, parse_fetch_response, PackData};

use git_transport::TransportError;

/// Errors that can occur during protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    #[error("invalid ref advertisement: {0}")]
    InvalidAdvertisement(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("remote error: {0}")]
    ServerError(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Pack(#[from] git_pack::PackError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
