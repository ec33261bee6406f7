//! Write the entries of a pack stream into the store.

use git_hash::ObjectId;
use git_object::RawObject;
use git_pack::delta::apply_delta;
use git_pack::{EntryPayload, PackStream, Trailer};
use tracing::{debug, info};

use crate::{ObjectStore, OdbError};

/// Counts reported after a pack has been unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackStats {
    /// Entries stored as they arrived.
    pub objects: usize,
    /// Ref-delta entries resolved against a stored base.
    pub deltas: usize,
    /// Deltas that had to wait for a base appearing later in the pack.
    pub deferred: usize,
    pub trailer: Trailer,
}

struct PendingDelta {
    offset: usize,
    base: ObjectId,
    delta: Vec<u8>,
}

/// Store every entry of `stream`.
///
/// Direct entries are written immediately. A ref-delta is applied to its
/// base read back from the store and the result is stored with the base's
/// kind. Deltas whose base is not stored yet are queued and retried once
/// the rest of the pack is in; any base still missing then is
/// [`OdbError::NotFound`].
pub fn unpack_pack(
    store: &ObjectStore,
    mut stream: PackStream<'_>,
) -> Result<UnpackStats, OdbError> {
    let mut stats = UnpackStats {
        objects: 0,
        deltas: 0,
        deferred: 0,
        trailer: Trailer::Absent,
    };
    let mut pending = Vec::new();

    for entry in stream.by_ref() {
        let entry = entry?;
        match entry.payload {
            EntryPayload::Object { kind, data } => {
                let oid = store.write(kind, &data)?;
                debug!(%oid, %kind, offset = entry.offset, "unpacked object");
                stats.objects += 1;
            }
            EntryPayload::RefDelta { base, delta } => {
                if store.contains(&base) {
                    resolve(store, &base, &delta, entry.offset)?;
                    stats.deltas += 1;
                } else {
                    debug!(%base, offset = entry.offset, "base not stored yet, deferring delta");
                    pending.push(PendingDelta {
                        offset: entry.offset,
                        base,
                        delta,
                    });
                }
            }
        }
    }

    stats.deferred = pending.len();
    while !pending.is_empty() {
        let before = pending.len();
        let mut still_pending = Vec::with_capacity(before);
        for p in pending {
            if store.contains(&p.base) {
                resolve(store, &p.base, &p.delta, p.offset)?;
                stats.deltas += 1;
            } else {
                still_pending.push(p);
            }
        }
        if still_pending.len() == before {
            let missing = still_pending[0].base;
            return Err(OdbError::NotFound(missing));
        }
        pending = still_pending;
    }

    stats.trailer = stream.finish()?;
    info!(
        objects = stats.objects,
        deltas = stats.deltas,
        deferred = stats.deferred,
        "pack unpacked"
    );
    Ok(stats)
}

fn resolve(
    store: &ObjectStore,
    base: &ObjectId,
    delta: &[u8],
    offset: usize,
) -> Result<ObjectId, OdbError> {
    let base_obj = store.read(base)?;
    let data = apply_delta(&base_obj.data, delta)?;
    let oid = store.write_raw(&RawObject::new(base_obj.kind, data))?;
    debug!(%oid, %base, offset, "resolved delta");
    Ok(oid)
}
