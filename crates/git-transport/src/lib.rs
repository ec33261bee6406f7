//! Transport for the git smart HTTP protocol.
//!
//! This crate only moves bytes: one GET for the ref advertisement and one
//! POST per upload-pack request. Framing and protocol logic live in
//! `git-protocol`.

pub mod http;
pub mod url;

pub use http::HttpTransport;
pub use url::{GitUrl, Scheme};

/// Service name of the fetch side of the smart protocol.
pub const UPLOAD_PACK: &str = "git-upload-pack";

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{url} is not a smart HTTP server (content type {content_type:?})")]
    NotSmartHttp { url: String, content_type: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A connection to a remote upload-pack service.
///
/// Both calls block until the whole response body has arrived.
pub trait Transport {
    /// Fetch the ref advertisement (`GET <url>/info/refs?service=git-upload-pack`).
    fn advertised_refs(&self) -> Result<Vec<u8>, TransportError>;

    /// Send a protocol v2 request (`POST <url>/git-upload-pack`) and return
    /// the response body.
    fn upload_pack(&self, request: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn advertised_refs(&self) -> Result<Vec<u8>, TransportError> {
        (**self).advertised_refs()
    }

    fn upload_pack(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).upload_pack(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn advertised_refs(&self) -> Result<Vec<u8>, TransportError> {
        (**self).advertised_refs()
    }

    fn upload_pack(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).upload_pack(request)
    }
}

/// Open a transport for `url`.
pub fn connect(url: &str, user_agent: &str) -> Result<HttpTransport, TransportError> {
    HttpTransport::new(GitUrl::parse(url)?, user_agent)
}
