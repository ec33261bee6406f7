use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use git_hash::hasher::Hasher;
use git_object::ObjectType;
use git_pack::delta::{apply_delta, encode_copy, encode_insert, write_size_varint};
use git_pack::entry::encode_entry_header;
use git_pack::verify::pack_checksum;
use git_pack::{
    parse_pack_prefix, EntryPayload, PackEntryType, PackError, PackStream, Trailer,
    PACK_PREFIX_SIZE,
};
use proptest::prelude::*;

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Build a complete pack: prefix, count, entries, trailer.
fn build_pack(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    for e in entries {
        body.extend_from_slice(e);
    }
    let trailer = pack_checksum(2, &body).unwrap();
    let mut pack = b"PACK\0\0\0\x02".to_vec();
    pack.extend(body);
    pack.extend_from_slice(trailer.as_bytes());
    pack
}

fn direct(t: PackEntryType, data: &[u8]) -> Vec<u8> {
    let mut out = encode_entry_header(t, data.len() as u64);
    out.extend(deflate(data));
    out
}

fn ref_delta(base: &[u8], delta: &[u8]) -> Vec<u8> {
    let base_id = Hasher::hash_object("blob", base).unwrap();
    let mut out = encode_entry_header(PackEntryType::RefDelta, delta.len() as u64);
    out.extend_from_slice(base_id.as_bytes());
    out.extend(deflate(delta));
    out
}

#[test]
fn full_pack_with_delta_and_trailer() {
    let base = b"The quick brown fox";
    let mut delta = write_size_varint(base.len() as u64);
    delta.extend(write_size_varint(20));
    delta.extend(encode_copy(4, 6));
    delta.extend(encode_insert(b"slow "));
    delta.extend(encode_copy(10, 9));

    let pack = build_pack(&[
        direct(PackEntryType::Blob, base),
        direct(PackEntryType::Commit, b"not parsed here"),
        ref_delta(base, &delta),
    ]);

    let version = parse_pack_prefix(&pack).unwrap();
    let mut stream = PackStream::new(&pack[PACK_PREFIX_SIZE..])
        .unwrap()
        .with_version(version);
    assert_eq!(stream.object_count(), 3);

    let entries: Vec<_> = stream.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(entries.len(), 3);

    let EntryPayload::Object { kind, data } = &entries[0].payload else {
        panic!("expected a direct object");
    };
    assert_eq!(*kind, ObjectType::Blob);

    let EntryPayload::RefDelta { base: base_id, delta } = &entries[2].payload else {
        panic!("expected a ref delta");
    };
    assert_eq!(*base_id, Hasher::hash_object("blob", data).unwrap());
    assert_eq!(apply_delta(data, delta).unwrap(), b"quick slow brown fox");

    assert!(matches!(stream.finish().unwrap(), Trailer::Verified(_)));
}

#[test]
fn corrupted_trailer_is_detected() {
    let mut pack = build_pack(&[direct(PackEntryType::Blob, b"x")]);
    let last = pack.len() - 1;
    pack[last] ^= 0xff;

    let mut stream = PackStream::new(&pack[PACK_PREFIX_SIZE..]).unwrap();
    assert!(stream.next().unwrap().is_ok());
    assert!(stream.next().is_none());
    assert!(matches!(
        stream.finish(),
        Err(PackError::ChecksumMismatch { .. })
    ));
}

#[test]
fn stream_without_trailer() {
    let mut body = 1u32.to_be_bytes().to_vec();
    body.extend(direct(PackEntryType::Tag, b"object 0\n"));
    let mut stream = PackStream::new(&body).unwrap();
    assert!(stream.next().unwrap().is_ok());
    assert_eq!(stream.finish().unwrap(), Trailer::Absent);
}

#[test]
fn finishing_early_is_an_error() {
    let pack = build_pack(&[
        direct(PackEntryType::Blob, b"a"),
        direct(PackEntryType::Blob, b"b"),
    ]);
    let mut stream = PackStream::new(&pack[PACK_PREFIX_SIZE..]).unwrap();
    stream.next();
    assert!(stream.finish().is_err());
}

#[derive(Debug, Clone)]
enum Op {
    Copy(usize, usize),
    Insert(Vec<u8>),
}

fn op_strategy(base_len: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..base_len).prop_flat_map(move |start| {
            (Just(start), 1..=(base_len - start)).prop_map(|(s, n)| Op::Copy(s, n))
        }),
        proptest::collection::vec(any::<u8>(), 1..200).prop_map(Op::Insert),
    ]
}

proptest! {
    /// Applying encoded ops matches doing the copies and inserts by hand.
    #[test]
    fn apply_matches_direct_model(
        (base, ops) in proptest::collection::vec(any::<u8>(), 1..2048)
            .prop_flat_map(|base| {
                let len = base.len();
                (Just(base), proptest::collection::vec(op_strategy(len), 0..16))
            })
    ) {
        let mut expected = Vec::new();
        let mut encoded = Vec::new();
        for op in &ops {
            match op {
                Op::Copy(start, n) => {
                    expected.extend_from_slice(&base[*start..start + n]);
                    encoded.extend(encode_copy(*start as u32, *n as u32));
                }
                Op::Insert(bytes) => {
                    expected.extend_from_slice(bytes);
                    encoded.extend(encode_insert(bytes));
                }
            }
        }
        let mut delta = write_size_varint(base.len() as u64);
        delta.extend(write_size_varint(expected.len() as u64));
        delta.extend(encoded);

        prop_assert_eq!(apply_delta(&base, &delta).unwrap(), expected);
    }

    /// Every size survives the entry header encoding, whatever the type.
    #[test]
    fn entry_header_size_is_preserved(size in any::<u32>(), t in 1u8..=4) {
        let entry_type = PackEntryType::from_type_number(t).unwrap();
        let encoded = encode_entry_header(entry_type, u64::from(size));
        let header = git_pack::entry::parse_entry_header(&encoded, 0).unwrap();
        prop_assert_eq!(header.entry_type, entry_type);
        prop_assert_eq!(header.size, u64::from(size));
        prop_assert_eq!(header.header_len, encoded.len());
    }
}
