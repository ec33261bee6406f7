//! Capabilities advertised after the NUL byte of the first ref line.
//!
//! `<oid> HEAD\0multi_ack side-band-64k ofs-delta symref=HEAD:refs/heads/main agent=git/2.39.0`

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    entries: Vec<CapabilityEntry>,
}

/// A single capability, optionally with a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityEntry {
    pub name: String,
    pub value: Option<String>,
}

impl Capabilities {
    /// Parse a space-separated capability list.
    pub fn parse(caps: &str) -> Self {
        let entries = caps
            .split_whitespace()
            .map(|cap| match cap.split_once('=') {
                Some((name, value)) => CapabilityEntry {
                    name: name.to_string(),
                    value: Some(value.to_string()),
                },
                None => CapabilityEntry {
                    name: cap.to_string(),
                    value: None,
                },
            })
            .collect();
        Self { entries }
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Value of the first occurrence of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_deref())
    }

    /// All values of a capability that may repeat, such as `symref`.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.name == name)
            .filter_map(|e| e.value.as_deref())
    }

    /// Target of the symbolic ref `name` (`symref=<name>:<target>`).
    pub fn symref_target(&self, name: &str) -> Option<&str> {
        self.get_all("symref").find_map(|v| {
            let (source, target) = v.split_once(':')?;
            (source == name).then_some(target)
        })
    }

    pub fn entries(&self) -> &[CapabilityEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match &e.value {
                Some(v) => write!(f, "{}={}", e.name, v)?,
                None => f.write_str(&e.name)?,
            }
        }
        Ok(())
    }
}
