//! Listing attribution and detail parsing throughput
//!
//! A label page can carry a few hundred tiles; every link walks its ancestor chain and
//! re-scans subtrees, so attribution cost grows with page size and nesting depth.

use catalog_harvest::domain::{DateRange, extract_release_date};
use catalog_harvest::infrastructure::{AlbumDetailParser, ListingContext, ListingParser};
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use scraper::Html;

const PAGE_URL: &str = "https://shop.example/us-en/label/acme/download-streaming-albums/42";

fn synthetic_listing(tiles: usize, nesting: usize) -> String {
    let mut body = String::with_capacity(tiles * 256);
    for i in 0..tiles {
        let open = "<div>".repeat(nesting);
        let close = "</div>".repeat(nesting);
        body.push_str(&format!(
            r#"<article>{open}<a href="/us-en/album/title-{i}/id{i}">Title {i}</a>{close}<p>Released on Jan {day}, 2026 by Acme</p></article>"#,
            open = open,
            close = close,
            i = i,
            day = i % 28 + 1,
        ));
    }
    format!("<html><body><main>{}</main></body></html>", body)
}

const DETAIL: &str = r#"<html><body>
    <h1>Cello Suites by Jane Doe</h1>
    <ul><li>Released on Jan 20, 2026 by Acme</li><li>Main artists: <a href="/a/1">Jane Doe</a></li></ul>
    <p>Total length: 01:12:05</p>
    <section><h2>About the album</h2><ul><li>Genre: Classical / Chamber Music</li></ul></section>
</body></html>"#;

fn listing_attribution(c: &mut Criterion) {
    let parser = ListingParser::new().unwrap();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
    );
    let context = ListingContext::new(PAGE_URL, "Acme", range);

    let mut group = c.benchmark_group("listing_attribution");
    for (tiles, nesting) in [(50, 1), (200, 1), (200, 6)] {
        let markup = synthetic_listing(tiles, nesting);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", tiles, nesting)),
            &markup,
            |b, markup| {
                b.iter(|| {
                    let html = Html::parse_document(black_box(markup));
                    parser.extract_candidates(&html, &context).unwrap().len()
                })
            },
        );
    }
    group.finish();
}

fn detail_parsing(c: &mut Criterion) {
    let parser = AlbumDetailParser::new().unwrap();
    c.bench_function("detail_page", |b| {
        b.iter(|| parser.parse(&Html::parse_document(black_box(DETAIL))))
    });
}

fn release_phrases(c: &mut Criterion) {
    c.bench_function("release_phrase_chain", |b| {
        b.iter(|| extract_release_date(black_box("Title 12 To be released on 2/27/26")))
    });
}

criterion_group!(benches, listing_attribution, detail_parsing, release_phrases);
criterion_main!(benches);
