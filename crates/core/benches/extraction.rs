use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use reprise_core::{Document, ExtractConfig, SearchConfig, extract_page, parse_reply, parse_results, preprocess_html};

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let article = fixture("article.html");
    let search = fixture("search_results.html");

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("article", "fixture"), &article, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("search_results", "fixture"), &search, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_search_results(c: &mut Criterion) {
    let html = fixture("search_results.html");
    let config = SearchConfig::default();

    c.bench_function("parse_results", |b| b.iter(|| parse_results(black_box(&html), 5, &config)));
}

fn bench_preprocess(c: &mut Criterion) {
    let html = fixture("article.html");
    let config = Default::default();

    c.bench_function("preprocess", |b| b.iter(|| preprocess_html(black_box(&html), &config)));
}

fn bench_extraction(c: &mut Criterion) {
    let config = ExtractConfig::default();
    let mut group = c.benchmark_group("extract_page");

    for name in ["article.html", "paragraphs_only.html", "boilerplate.html"] {
        let html = fixture(name);
        group.bench_with_input(BenchmarkId::from_parameter(name), &html, |b, html| {
            b.iter(|| extract_page(black_box(html), black_box(&config)))
        });
    }

    group.finish();
}

fn bench_parse_reply(c: &mut Criterion) {
    let body = "Paragraph of generated markdown text.\n\n".repeat(200);
    let reply = format!("TITLE: Improved\n\nEXCERPT: Summary.\n\nCONTENT:\n{}", body);

    c.bench_function("parse_reply", |b| b.iter(|| parse_reply(black_box(&reply), "Original")));
}

criterion_group!(
    benches,
    bench_parse,
    bench_search_results,
    bench_preprocess,
    bench_extraction,
    bench_parse_reply
);
criterion_main!(benches);
