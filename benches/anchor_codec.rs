//! Anchor Codec Benchmarks
//!
//! Encoding and decoding positions over documents fragmented by highlight
//! markup, and highlight creation over a long chapter.
//!
//! Run with: `cargo bench --bench anchor_codec`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use marginalia::anchor::{decode, encode};
use marginalia::dom::TextIndex;
use marginalia::{parse_xhtml, Document, HighlightSet, NodeId, Position, Range};

/// Chapter with `paragraphs` paragraphs of mixed inline markup
fn create_chapter(paragraphs: usize) -> String {
    let mut body = String::new();
    for i in 0..paragraphs {
        body.push_str(&format!(
            "<p>Paragraph {} opens with <em>emphasis</em>, carries a <span>plain span</span> \
             and closes<br/>after a line break.</p>",
            i
        ));
    }
    format!("<html><body>{}</body></html>", body)
}

fn paragraphs(doc: &Document) -> Vec<NodeId> {
    let html = doc.document_element().expect("root element");
    let body = doc.children(html)[0];
    doc.children(body).to_vec()
}

/// Point at absolute character `offset` within `container`
fn point(doc: &Document, container: NodeId, offset: usize) -> Position {
    let index = TextIndex::build(doc, container);
    doc.descendant_texts(container)
        .into_iter()
        .find_map(|text| {
            let (start, end) = index.span(text)?;
            (offset >= start && offset <= end).then(|| Position::new(text, offset - start))
        })
        .expect("offset inside container")
}

/// Highlight a stretch of every paragraph so text runs are split up
fn fragmented(paragraph_count: usize) -> Document {
    let mut doc = parse_xhtml(&create_chapter(paragraph_count)).expect("valid chapter");
    let mut set = HighlightSet::new("#fff580");
    for p in paragraphs(&doc) {
        let range = Range::new(point(&doc, p, 4), point(&doc, p, 30));
        set.create(&mut doc, range).expect("highlight");
    }
    doc
}

/// Benchmark encoding a position inside wrapped text
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("anchor_encode");

    for count in [10, 100] {
        let doc = fragmented(count);
        let last = *paragraphs(&doc).last().expect("paragraph");
        let position = point(&doc, last, 20);

        group.bench_with_input(BenchmarkId::new("paragraphs", count), &position, |b, pos| {
            b.iter(|| black_box(encode(&doc, black_box(*pos))))
        });
    }

    group.finish();
}

/// Benchmark resolving an anchor back to a live position
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("anchor_decode");

    for count in [10, 100] {
        let doc = fragmented(count);
        let last = *paragraphs(&doc).last().expect("paragraph");
        let anchor = encode(&doc, point(&doc, last, 20));

        group.bench_with_input(BenchmarkId::new("paragraphs", count), &anchor, |b, anchor| {
            b.iter(|| black_box(decode(&doc, black_box(anchor))))
        });
    }

    group.finish();
}

/// Benchmark merging a selection that bridges existing highlights
fn bench_highlight_merge(c: &mut Criterion) {
    let source = create_chapter(50);

    c.bench_function("highlight_bridge_merge", |b| {
        b.iter(|| {
            let mut doc = parse_xhtml(&source).expect("valid chapter");
            let mut set = HighlightSet::new("#fff580");
            let ps = paragraphs(&doc);
            for &p in &ps {
                let range = Range::new(point(&doc, p, 2), point(&doc, p, 12));
                set.create(&mut doc, range).expect("highlight");
            }
            let first = ps[0];
            let last = ps[ps.len() - 1];
            let bridge = Range::new(point(&doc, first, 8), point(&doc, last, 8));
            set.create(&mut doc, bridge).expect("highlight");
            black_box(set.len())
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_highlight_merge);
criterion_main!(benches);
