use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use git_pack::delta::{apply_delta, encode_copy, encode_insert, write_size_varint};

/// A delta that copies `base` in 1 KiB runs with a short insert between runs.
fn interleaved_delta(base: &[u8]) -> Vec<u8> {
    let mut ops = Vec::new();
    let mut target_len = 0u64;
    for start in (0..base.len()).step_by(1024) {
        let len = 1024.min(base.len() - start);
        ops.extend(encode_copy(start as u32, len as u32));
        ops.extend(encode_insert(b"<edit>"));
        target_len += len as u64 + 6;
    }
    let mut delta = write_size_varint(base.len() as u64);
    delta.extend(write_size_varint(target_len));
    delta.extend(ops);
    delta
}

fn bench_delta_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_apply");
    for size in [4 * 1024usize, 64 * 1024, 1024 * 1024] {
        let base: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        let delta = interleaved_delta(&base);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{}k", size / 1024), |b| {
            b.iter(|| apply_delta(black_box(&base), black_box(&delta)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_delta_apply);
criterion_main!(benches);
