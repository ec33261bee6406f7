//! Remote URL parsing.
//!
//! Only the smart HTTP schemes are reachable:
//! - `http://host[:port]/path`
//! - `https://host[:port]/path`
//!
//! Other git URL forms (`ssh://`, `git://`, `file://`, scp-like
//! `host:path`, local paths) are recognised and refused with
//! [`TransportError::UnsupportedScheme`].

use std::fmt;

use crate::TransportError;

/// URL scheme of a smart HTTP remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: Option<u16>,
    /// Repository path with a leading `/` and no trailing `/`.
    pub path: String,
}

impl GitUrl {
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TransportError::InvalidUrl("empty URL".into()));
        }

        if let Some(rest) = url.strip_prefix("http://") {
            return parse_authority_and_path(Scheme::Http, rest);
        }
        if let Some(rest) = url.strip_prefix("https://") {
            return parse_authority_and_path(Scheme::Https, rest);
        }

        let scheme = match url.find("://") {
            Some(pos) => &url[..pos],
            None if url.contains(':') && !url.starts_with('/') => "ssh",
            None => "file",
        };
        Err(TransportError::UnsupportedScheme(scheme.to_string()))
    }

    /// Ref advertisement endpoint for `service`.
    pub fn info_refs_url(&self, service: &str) -> String {
        format!("{self}/info/refs?service={service}")
    }

    /// POST endpoint for `service`.
    pub fn service_url(&self, service: &str) -> String {
        format!("{self}/{service}")
    }

    /// Last path component without a `.git` suffix, as used for the
    /// default clone directory.
    pub fn humanish_name(&self) -> Option<&str> {
        let last = self.path.rsplit('/').next()?;
        let name = last.strip_suffix(".git").unwrap_or(last);
        (!name.is_empty()).then_some(name)
    }
}

impl fmt::Display for GitUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)
    }
}

impl std::str::FromStr for GitUrl {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `host[:port][/path]`, scheme already stripped.
fn parse_authority_and_path(scheme: Scheme, rest: &str) -> Result<GitUrl, TransportError> {
    let (authority, path) = match rest.find('/') {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };

    if authority.contains('@') {
        return Err(TransportError::InvalidUrl(
            "credentials in URLs are not supported".into(),
        ));
    }

    let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
        let end = v6
            .find(']')
            .ok_or_else(|| TransportError::InvalidUrl("unclosed IPv6 bracket".into()))?;
        let port = match v6[end + 1..].strip_prefix(':') {
            Some(p) => Some(parse_port(p)?),
            None => None,
        };
        (format!("[{}]", &v6[..end]), port)
    } else if let Some((host, port)) = authority.rsplit_once(':') {
        (host.to_string(), Some(parse_port(port)?))
    } else {
        (authority.to_string(), None)
    };

    if host.is_empty() {
        return Err(TransportError::InvalidUrl("empty host".into()));
    }

    Ok(GitUrl {
        scheme,
        host,
        port,
        path: path.trim_end_matches('/').to_string(),
    })
}

fn parse_port(s: &str) -> Result<u16, TransportError> {
    s.parse()
        .map_err(|_| TransportError::InvalidUrl(format!("invalid port: {s}")))
}
