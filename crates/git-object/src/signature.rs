use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::Local;

use crate::ObjectError;

/// A point in time as recorded in commits: seconds since the epoch plus
/// the author's UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    pub timestamp: i64,
    /// Offset from UTC in minutes (e.g. -360 for `-0600`).
    pub tz_offset: i32,
}

/// `-0130` parsed as the integer -130 becomes -90 minutes.
fn tz_offset_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    sign * ((abs / 100) * 60 + abs % 100)
}

fn minutes_to_tz_offset(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.unsigned_abs() as i32;
    sign * ((abs / 60) * 100 + abs % 60)
}

impl GitDate {
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// The current time in the local timezone.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            timestamp: now.timestamp(),
            tz_offset: now.offset().local_minus_utc() / 60,
        }
    }

    /// Parse the raw form `"<unix-ts> <+hhmm>"`. The offset may be omitted.
    pub fn parse_raw(input: &str) -> Result<Self, ObjectError> {
        let input = input.trim();
        let (ts, tz) = match input.split_once(' ') {
            Some((ts, tz)) => (ts, Some(tz.trim())),
            None => (input, None),
        };

        let timestamp: i64 = ts
            .parse()
            .map_err(|_| ObjectError::InvalidSignature(format!("invalid timestamp: '{ts}'")))?;

        let tz_offset = match tz {
            Some(tz) => {
                let valid = tz.len() == 5
                    && (tz.starts_with('+') || tz.starts_with('-'))
                    && tz[1..].bytes().all(|b| b.is_ascii_digit());
                if !valid {
                    return Err(ObjectError::InvalidSignature(format!(
                        "invalid timezone: '{tz}'"
                    )));
                }
                let raw: i32 = tz.parse().map_err(|_| {
                    ObjectError::InvalidSignature(format!("invalid timezone: '{tz}'"))
                })?;
                tz_offset_to_minutes(raw)
            }
            None => 0,
        };

        Ok(Self {
            timestamp,
            tz_offset,
        })
    }

    /// Format as `"<unix-ts> <+hhmm>"`.
    pub fn to_raw(&self) -> String {
        format!(
            "{} {:+05}",
            self.timestamp,
            minutes_to_tz_offset(self.tz_offset)
        )
    }
}

/// Author/committer identity with timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    pub fn new(name: impl Into<BString>, email: impl Into<BString>, date: GitDate) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            date,
        }
    }

    /// Parse `Name <email> timestamp tz`.
    pub fn parse(input: &BStr) -> Result<Self, ObjectError> {
        let input = input.as_bytes();

        let gt_pos = input
            .rfind_byte(b'>')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '>' in signature".into()))?;
        let lt_pos = input[..gt_pos]
            .rfind_byte(b'<')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '<' in signature".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];
        let date_str = std::str::from_utf8(input[gt_pos + 1..].trim())
            .map_err(|_| ObjectError::InvalidSignature("non-UTF-8 date in signature".into()))?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date: GitDate::parse_raw(date_str)?,
        })
    }

    /// Canonical form: `Name <email> timestamp tz`.
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.date.to_raw());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_signature() {
        let sig = Signature::parse(BStr::new("ggzor <ggzor@example.com> 1714599041 -0600")).unwrap();
        assert_eq!(sig.name, "ggzor");
        assert_eq!(sig.email, "ggzor@example.com");
        assert_eq!(sig.date.timestamp, 1714599041);
        assert_eq!(sig.date.tz_offset, -360);
    }

    #[test]
    fn signature_roundtrip() {
        let raw = "A U Thor <author@example.com> 1112911993 +0530";
        let sig = Signature::parse(BStr::new(raw)).unwrap();
        assert_eq!(sig.date.tz_offset, 330);
        assert_eq!(sig.to_bytes(), raw);
    }

    #[test]
    fn negative_partial_hour_offset() {
        let date = GitDate::parse_raw("0 -0030").unwrap();
        assert_eq!(date.tz_offset, -30);
        assert_eq!(date.to_raw(), "0 -0030");
    }

    #[test]
    fn missing_brackets() {
        assert!(Signature::parse(BStr::new("nobody 123 +0000")).is_err());
    }

    #[test]
    fn bad_timezone() {
        assert!(GitDate::parse_raw("123 0000").is_err());
        assert!(GitDate::parse_raw("123 +00").is_err());
        assert!(GitDate::parse_raw("abc +0000").is_err());
    }

    #[test]
    fn now_is_after_2020() {
        assert!(GitDate::now().timestamp > 1_577_836_800);
    }
}
