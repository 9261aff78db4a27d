use criterion::{black_box, criterion_group, criterion_main, Criterion};
use maxres::classify::classify_tag;
use maxres::codec::decode_to_legacy;
use maxres::io_stream::{ResReader, ResWriter};
use std::io::Cursor;

fn build_archive(entries: usize, size: usize) -> Vec<u8> {
    let mut w = ResWriter::new(Cursor::new(Vec::new())).unwrap();
    let payload = vec![0x5au8; size];
    for i in 0..entries {
        w.add_entry(&format!("S_{i:06}"), &payload).unwrap();
    }
    w.finalize().unwrap().into_inner()
}

fn bench_classify(c: &mut Criterion) {
    let tags = ["FONT_01", "A_PIC", "HELP_ENG", "DESERT_3", "MAINFLC", "XYZZY"];
    c.bench_function("classify_tags", |b| {
        b.iter(|| {
            for t in &tags {
                black_box(classify_tag(black_box(t)));
            }
        })
    });
}

fn bench_extract(c: &mut Criterion) {
    let bytes = build_archive(1000, 4096);

    c.bench_function("open_1000_entries", |b| {
        b.iter(|| ResReader::open(Cursor::new(black_box(&bytes[..]))).unwrap())
    });

    c.bench_function("extract_all_4mb", |b| {
        b.iter(|| {
            let mut r = ResReader::open(Cursor::new(&bytes[..])).unwrap();
            black_box(r.extract_all().extracted())
        })
    });
}

fn bench_downconvert(c: &mut Criterion) {
    let text = "Le Général a déployé l'unité près du cratère. ".repeat(2000);
    c.bench_function("decode_to_legacy_90kb", |b| {
        b.iter(|| decode_to_legacy(black_box(&text)))
    });
}

criterion_group!(benches, bench_classify, bench_extract, bench_downconvert);
criterion_main!(benches);
