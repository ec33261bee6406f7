//! Apply delta ops to reconstruct objects.

use super::{Delta, DeltaOp};
use crate::PackError;

/// Upper bound on the up-front allocation taken from the declared target
/// size; the buffer still grows past it if the ops need more.
const MAX_PREALLOC: u64 = 16 << 20;

/// Apply a delta to `base`, producing the target content.
///
/// The declared base size must equal `base.len()`, every copy must stay
/// inside the base, and the result must have the declared target size.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PackError> {
    let delta = Delta::parse(delta)?;

    if delta.base_size != base.len() as u64 {
        return Err(PackError::InvalidDelta {
            offset: 0,
            reason: format!(
                "base size mismatch: delta says {}, base is {}",
                delta.base_size,
                base.len()
            ),
        });
    }

    let mut output = Vec::with_capacity(delta.target_size.min(MAX_PREALLOC) as usize);

    for op in delta.ops() {
        match op? {
            DeltaOp::Copy { offset, size } => {
                let range = offset
                    .checked_add(size)
                    .filter(|&end| end <= base.len())
                    .map(|end| offset..end)
                    .ok_or_else(|| PackError::InvalidDelta {
                        offset: output.len(),
                        reason: format!(
                            "copy out of bounds: offset={offset}, size={size}, base_len={}",
                            base.len()
                        ),
                    })?;
                output.extend_from_slice(&base[range]);
            }
            DeltaOp::Insert(bytes) => output.extend_from_slice(bytes),
        }
    }

    if output.len() as u64 != delta.target_size {
        return Err(PackError::InvalidDelta {
            offset: 0,
            reason: format!(
                "target size mismatch: delta says {}, got {}",
                delta.target_size,
                output.len()
            ),
        });
    }

    Ok(output)
}
