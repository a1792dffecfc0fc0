use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use webserver::request::Request;
use webserver::util::{get_mime, HtmlBuilder};
use webserver::{normalize_target, Response};

fn simple_request_parse_benchmark(c: &mut Criterion) {
    let request = "GET / HTTP/1.0";

    c.bench_function("simple_request_parse", |b| {
        b.iter(|| {
            let _ = Request::parse(black_box(request), 0).unwrap();
        });
    });
}

fn request_with_headers_parse_benchmark(c: &mut Criterion) {
    // 请求头已被拼接进同一个缓冲区，解析时只看前三个记号
    let request = "GET /path/to/resource.html HTTP/1.0 \
                   Host: localhost:8080 \
                   User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                   Accept: text/html,application/xhtml+xml \
                   Accept-Language: en-US,en;q=0.9";

    c.bench_function("request_with_headers_parse", |b| {
        b.iter(|| {
            let _ = Request::parse(black_box(request), 0).unwrap();
        });
    });
}

fn mime_lookup_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mime_lookup");

    for target in ["index.html", "img/logo.png", "app.js", "archive.tar.gz", "README"] {
        group.bench_with_input(BenchmarkId::from_parameter(target), target, |b, target| {
            b.iter(|| get_mime(black_box(target)));
        });
    }

    group.finish();
}

fn normalize_target_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_target");

    for target in ["/", "/docs/", "/index.html?", "/a/b/c/d/e/page.html"] {
        group.bench_with_input(BenchmarkId::from_parameter(target), target, |b, target| {
            b.iter(|| normalize_target(black_box(target), "index.html"));
        });
    }

    group.finish();
}

fn error_page_benchmark(c: &mut Criterion) {
    c.bench_function("html_builder_404", |b| {
        b.iter(|| HtmlBuilder::from_status_code(black_box(404)).build());
    });

    c.bench_function("response_404_as_bytes", |b| {
        b.iter(|| Response::response_404(black_box(true), 0).as_bytes());
    });
}

criterion_group!(
    benches,
    simple_request_parse_benchmark,
    request_with_headers_parse_benchmark,
    mime_lookup_benchmark,
    normalize_target_benchmark,
    error_page_benchmark
);
criterion_main!(benches);
