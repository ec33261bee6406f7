use crate::{ObjectError, ObjectType};

/// Parse an object header from raw bytes.
///
/// The header format is `"<type> <size>\0"`. Returns `(type, content_size, header_length)`
/// where `header_length` includes the null terminator.
pub fn parse_header(data: &[u8]) -> Result<(ObjectType, usize, usize), ObjectError> {
    let null_pos = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ObjectError::InvalidHeader("missing null terminator".into()))?;

    let header = &data[..null_pos];
    let space_pos = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ObjectError::InvalidHeader("missing space in header".into()))?;

    let obj_type = ObjectType::from_bytes(&header[..space_pos])?;

    let size_bytes = &header[space_pos + 1..];
    if size_bytes.is_empty() || !size_bytes.iter().all(u8::is_ascii_digit) {
        return Err(ObjectError::InvalidHeader(format!(
            "invalid size: {}",
            String::from_utf8_lossy(size_bytes)
        )));
    }
    let size_str = std::str::from_utf8(size_bytes)
        .map_err(|_| ObjectError::InvalidHeader("non-ASCII size".into()))?;
    let content_size: usize = size_str
        .parse()
        .map_err(|_| ObjectError::InvalidHeader(format!("invalid size: {size_str}")))?;

    Ok((obj_type, content_size, null_pos + 1))
}

/// Split a stored object into its kind and content, checking that the
/// declared size matches what follows the header.
pub fn split_object(data: &[u8]) -> Result<(ObjectType, &[u8]), ObjectError> {
    let (obj_type, size, header_len) = parse_header(data)?;
    let content = &data[header_len..];
    if content.len() != size {
        return Err(ObjectError::LengthMismatch {
            expected: size,
            actual: content.len(),
        });
    }
    Ok((obj_type, content))
}

/// Write an object header: `"<type> <size>\0"`.
pub fn write_header(obj_type: ObjectType, content_size: usize) -> Vec<u8> {
    format!("{} {}\0", obj_type, content_size).into_bytes()
}
