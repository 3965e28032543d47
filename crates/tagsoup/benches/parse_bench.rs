use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use dom::Document;
use tagsoup::{ParserConfig, parse_document};

const SMALL_ROWS: usize = 64;
const LARGE_ROWS: usize = 4_000;

/// Table soup in the style the recovery paths exist for: no cell or row end
/// tags, so every row exercises stop-set promotion.
fn make_soup(rows: usize) -> String {
    let mut out = String::with_capacity(rows * 48 + 64);
    out.push_str("<html><body><table>");
    for i in 0..rows {
        out.push_str("<tr><td>cell ");
        out.push_str(&i.to_string());
        out.push_str("<td>x &amp; y");
    }
    out.push_str("</table></body></html>");
    out
}

fn make_rawtext(bytes: usize) -> String {
    let mut out = String::with_capacity(bytes + 32);
    out.push_str("<script>");
    while out.len() < bytes {
        out.push_str("if (a<b) { x = '</scri'; }\n");
    }
    out.push_str("</script>");
    out
}

fn parse(input: &str) -> Document {
    let mut doc = Document::new();
    let config = ParserConfig::default();
    parse_document(&mut doc, &config, input.as_bytes()).expect("parse");
    doc
}

fn bench_parse_small(c: &mut Criterion) {
    let input = make_soup(SMALL_ROWS);
    c.bench_function("bench_parse_small", |b| {
        b.iter(|| {
            let doc = parse(black_box(&input));
            black_box(doc.children(doc.root()).len());
        });
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let input = make_soup(LARGE_ROWS);
    c.bench_function("bench_parse_large", |b| {
        b.iter_batched(
            || input.clone(),
            |input| {
                let doc = parse(black_box(&input));
                black_box(doc.children(doc.root()).len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_parse_rawtext(c: &mut Criterion) {
    let input = make_rawtext(256 * 1024);
    c.bench_function("bench_parse_rawtext", |b| {
        b.iter(|| {
            let doc = parse(black_box(&input));
            black_box(doc.children(doc.root()).len());
        });
    });
}

criterion_group!(
    benches,
    bench_parse_small,
    bench_parse_large,
    bench_parse_rawtext
);
criterion_main!(benches);
