use std::fmt;

use bstr::{BStr, BString, ByteSlice};

use crate::error::RefError;

/// A validated reference name.
///
/// Either `HEAD` or a full name under `refs/`. Within that, the usual
/// `git-check-ref-format(1)` rules apply:
/// - no ASCII control characters, space, `~`, `^`, `:`, `?`, `*`, `[`, `\`
/// - no `..`, `//` or `@{`
/// - no component starting with `.` or ending with `.lock`
/// - cannot end with `/` or `.`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefName(BString);

/// Characters forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[u8] = b" ~^:?*[\\";

const HEAD: &str = "HEAD";
const HEADS_PREFIX: &str = "refs/heads/";

impl RefName {
    /// Create and validate a ref name.
    pub fn new(name: impl Into<BString>) -> Result<Self, RefError> {
        let name = name.into();
        validate_ref_name(&name)?;
        Ok(Self(name))
    }

    /// The `HEAD` pseudo-ref.
    pub fn head() -> Self {
        Self(BString::from(HEAD))
    }

    /// `refs/heads/<branch>`.
    pub fn branch(branch: &str) -> Result<Self, RefError> {
        Self::new(format!("{HEADS_PREFIX}{branch}"))
    }

    /// Short name (`main` from `refs/heads/main`).
    pub fn short_name(&self) -> &BStr {
        let s: &[u8] = self.0.as_slice();
        s.strip_prefix(HEADS_PREFIX.as_bytes())
            .or_else(|| s.strip_prefix(b"refs/tags/"))
            .unwrap_or(s)
            .as_bstr()
    }

    /// Is this under `refs/heads/`?
    pub fn is_branch(&self) -> bool {
        self.0.starts_with(HEADS_PREFIX.as_bytes())
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD
    }

    pub fn as_bstr(&self) -> &BStr {
        self.0.as_bstr()
    }

    /// Validation admits printable ASCII only, so this never loses data.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("<invalid-utf8>")
    }
}

impl AsRef<BStr> for RefName {
    fn as_ref(&self) -> &BStr {
        self.0.as_bstr()
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefName {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn validate_ref_name(name: &[u8]) -> Result<(), RefError> {
    let invalid = |why: &str| {
        RefError::InvalidName(format!("'{}': {why}", String::from_utf8_lossy(name)))
    };

    if name.is_empty() {
        return Err(RefError::InvalidName("ref name is empty".into()));
    }
    if name == HEAD.as_bytes() {
        return Ok(());
    }
    if !name.starts_with(b"refs/") {
        return Err(invalid("must be HEAD or start with 'refs/'"));
    }

    if let Some(pos) = name.iter().position(|&b| b < 0x20 || b >= 0x7f) {
        return Err(invalid(&format!(
            "contains a control or non-ASCII byte at position {pos}"
        )));
    }
    if let Some(&b) = name.iter().find(|b| FORBIDDEN_CHARS.contains(b)) {
        return Err(invalid(&format!("contains forbidden character '{}'", b as char)));
    }
    for (pattern, what) in [
        (&b".."[..], "'..'"),
        (&b"//"[..], "'//'"),
        (&b"@{"[..], "'@{'"),
    ] {
        if name.find(pattern).is_some() {
            return Err(invalid(&format!("contains {what}")));
        }
    }
    if name.ends_with(b"/") || name.ends_with(b".") {
        return Err(invalid("ends with '/' or '.'"));
    }
    for component in name.split_str(b"/") {
        if component.starts_with(b".") {
            return Err(invalid("component starts with '.'"));
        }
        if component.ends_with(b".lock") {
            return Err(invalid("component ends with '.lock'"));
        }
    }

    Ok(())
}
