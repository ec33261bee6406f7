use bstr::{BStr, BString, ByteSlice};
use git_hash::ObjectId;

use crate::{ObjectError, Signature};

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Parent commits (empty for a root commit).
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    /// Headers we don't interpret (encoding, gpgsig, mergetag, ...) kept
    /// for round-trip. Multi-line values are stored with `\n` separators.
    pub extra_headers: Vec<(BString, BString)>,
    /// Everything after the blank line separator.
    pub message: BString,
}

impl Commit {
    /// Parse commit content (no object header).
    pub fn parse(data: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parents = Vec::new();
        let mut author: Option<Signature> = None;
        let mut committer: Option<Signature> = None;
        let mut extra_headers = Vec::new();

        let mut pos = 0;
        while pos < data.len() {
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .find_byte(b'\n')
                .map_or(data.len(), |p| p + pos);
            let line = &data[pos..line_end];
            let (key, value) = match line.find_byte(b' ') {
                Some(sp) => (&line[..sp], &line[sp + 1..]),
                None => (line, &b""[..]),
            };

            match key {
                b"tree" => tree = Some(parse_oid(value, "tree")?),
                b"parent" => parents.push(parse_oid(value, "parent")?),
                b"author" => author = Some(parse_signature(value)?),
                b"committer" => committer = Some(parse_signature(value)?),
                _ => {
                    // Continuation lines start with a single space.
                    let mut val = Vec::from(value);
                    let mut next = line_end + 1;
                    while next < data.len() && data[next] == b' ' {
                        let cont_end = data[next..]
                            .find_byte(b'\n')
                            .map_or(data.len(), |p| p + next);
                        val.push(b'\n');
                        val.extend_from_slice(&data[next + 1..cont_end]);
                        next = cont_end + 1;
                    }
                    extra_headers.push((BString::from(key), BString::from(val)));
                    pos = next;
                    continue;
                }
            }
            pos = line_end + 1;
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let author = author.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let committer =
            committer.ok_or(ObjectError::MissingCommitField { field: "committer" })?;

        Ok(Self {
            tree,
            parents,
            author,
            committer,
            extra_headers,
            message: BString::from(data.get(pos..).unwrap_or_default()),
        })
    }

    /// Serialize commit content (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');

        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }

        out.extend_from_slice(b"author ");
        out.extend_from_slice(&self.author.to_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"committer ");
        out.extend_from_slice(&self.committer.to_bytes());
        out.push(b'\n');

        for (key, val) in &self.extra_headers {
            out.extend_from_slice(key);
            out.push(b' ');
            out.extend_from_slice(&val.replace(b"\n", b"\n "));
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// First line of the message.
    pub fn summary(&self) -> &BStr {
        let msg: &[u8] = self.message.as_ref();
        match msg.find_byte(b'\n') {
            Some(pos) => BStr::new(&msg[..pos]),
            None => BStr::new(msg),
        }
    }
}

fn parse_oid(value: &[u8], field: &str) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF8 {field} id")))?;
    Ok(ObjectId::from_hex(hex)?)
}

fn parse_signature(data: &[u8]) -> Result<Signature, ObjectError> {
    Signature::parse(BStr::new(data))
}
