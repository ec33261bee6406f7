//! Smart HTTP over a blocking `reqwest` client.
//!
//! Discovery is a plain GET; the server answers with a protocol v0 ref
//! advertisement. Fetch requests are POSTed with `Git-Protocol: version=2`.
//! No timeout is set: a caller that needs bounded latency wraps the calls.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, info};

use crate::{GitUrl, Transport, TransportError, UPLOAD_PACK};

const ADVERTISEMENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
const REQUEST_TYPE: &str = "application/x-git-upload-pack-request";
const RESULT_TYPE: &str = "application/x-git-upload-pack-result";
const PROTOCOL_HEADER: &str = "Git-Protocol";
const PROTOCOL_V2: &str = "version=2";

/// Longest piece of an error body quoted in [`TransportError::Http`].
const MAX_ERROR_BODY: usize = 200;

/// HTTP(S) connection to one remote repository.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: GitUrl,
    client: Client,
}

impl HttpTransport {
    pub fn new(url: GitUrl, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(None::<Duration>)
            .build()
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &GitUrl {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn advertised_refs(&self) -> Result<Vec<u8>, TransportError> {
        let url = self.url.info_refs_url(UPLOAD_PACK);
        info!(%url, "discovering refs");
        let resp = self.client.get(&url).send().map_err(|source| TransportError::Request {
            url: url.clone(),
            source,
        })?;
        let resp = check_status(resp)?;

        if let Some(content_type) = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.starts_with(ADVERTISEMENT_TYPE) {
                return Err(TransportError::NotSmartHttp {
                    url,
                    content_type: content_type.to_string(),
                });
            }
        }

        read_body(&url, resp)
    }

    fn upload_pack(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let url = self.url.service_url(UPLOAD_PACK);
        info!(%url, request_bytes = request.len(), "requesting pack");
        let resp = self
            .client
            .post(&url)
            .header(PROTOCOL_HEADER, PROTOCOL_V2)
            .header(CONTENT_TYPE, REQUEST_TYPE)
            .header(ACCEPT, RESULT_TYPE)
            .body(request.to_vec())
            .send()
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        read_body(&url, check_status(resp)?)
    }
}

fn check_status(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut message = resp.text().unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    let message = match message.trim() {
        "" => status.canonical_reason().unwrap_or("request failed").to_string(),
        text => text.to_string(),
    };
    Err(TransportError::Http {
        status: status.as_u16(),
        message,
    })
}

fn read_body(url: &str, resp: Response) -> Result<Vec<u8>, TransportError> {
    let body = resp.bytes().map_err(|source| TransportError::Request {
        url: url.to_string(),
        source,
    })?;
    debug!(url, bytes = body.len(), "response received");
    Ok(body.to_vec())
}
