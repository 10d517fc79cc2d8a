#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;
use nsdom::reader::{EventType, PullReader, XmlPullReader};
use nsdom::writer::WriterOptions;
use nsdom::Document;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a record-oriented document with `records` entries.
fn make_records_xml(records: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..records {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\" status=\"active\">\
             <name>Record {i}</name>\
             <value>{}</value>\
             <note></note>\
             </record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates a document with many namespace declarations and prefixed
/// elements and attributes.
fn make_namespace_heavy_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<root xmlns=\"urn:default\"");
    for i in 0..20 {
        let _ = write!(xml, " xmlns:ns{i}=\"http://example.com/ns{i}\"");
    }
    xml.push_str(">\n");
    for i in 0..200 {
        let ns = i % 20;
        let _ = writeln!(
            xml,
            "  <ns{ns}:item ns{ns}:id=\"{i}\"><plain>Content {i}</plain></ns{ns}:item>"
        );
    }
    xml.push_str("</root>\n");
    xml
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_tokenize(c: &mut Criterion) {
    let xml = make_records_xml(500);
    c.bench_function("tokenize_records_500", |b| {
        b.iter(|| {
            let mut reader = XmlPullReader::new(black_box(&xml));
            let mut count = 0usize;
            while reader.next_token().expect("tokenize failed") != EventType::EndDocument {
                count += 1;
            }
            count
        });
    });
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for records in [10, 100, 1000] {
        let xml = make_records_xml(records);
        group.bench_with_input(BenchmarkId::new("records", records), &xml, |b, xml| {
            b.iter(|| Document::parse_str(black_box(xml)).expect("parse failed"));
        });
    }
    let ns_xml = make_namespace_heavy_xml();
    group.bench_function("namespace_heavy", |b| {
        b.iter(|| Document::parse_str(black_box(&ns_xml)).expect("parse failed"));
    });
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let doc = Document::parse_str(&make_namespace_heavy_xml()).expect("parse failed");
    c.bench_function("write_namespace_heavy", |b| {
        b.iter(|| {
            black_box(&doc)
                .to_xml_string_with_options(WriterOptions::default())
                .expect("write failed")
        });
    });
}

fn bench_roundtrip(c: &mut Criterion) {
    let xml = make_records_xml(500);
    c.bench_function("roundtrip_records_500", |b| {
        b.iter(|| {
            let doc = Document::parse_str(black_box(&xml)).expect("parse failed");
            doc.to_xml_string().expect("write failed")
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_write, bench_roundtrip);
criterion_main!(benches);
