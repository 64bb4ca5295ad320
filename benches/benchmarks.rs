// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Two hot paths:
//   1. Chunk decoding — NDJSON bytes in, StreamEvents out, at various chunk sizes
//   2. Session bookkeeping — per-token metrics and status formatting

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use genstream::infra::config::Config;
use genstream::stream::telemetry::{format_rate, SessionMetrics};
use genstream::stream::ChunkParser;

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A body of `n` token records followed by the final record.
fn build_body(n: usize) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..n {
        body.push_str(&format!(
            "{{\"model\":\"llama3\",\"response\":\"tok{} \u{e9}\",\"done\":false}}\n",
            i
        ));
    }
    body.push_str("{\"response\":\"\",\"done\":true,\"eval_count\":1000}\n");
    body.into_bytes()
}

fn decode_all(body: &[u8], chunk_size: usize) -> usize {
    let mut parser = ChunkParser::new();
    let mut count = 0;
    for chunk in body.chunks(chunk_size) {
        count += parser.feed(chunk).len();
    }
    count + parser.finish().len()
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_parser(c: &mut Criterion) {
    let body = build_body(1000);
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(body.len() as u64));

    group.bench_function("chunks_7b", |b| {
        b.iter(|| decode_all(black_box(&body), 7))
    });

    group.bench_function("chunks_64b", |b| {
        b.iter(|| decode_all(black_box(&body), 64))
    });

    group.bench_function("chunks_8kb", |b| {
        b.iter(|| decode_all(black_box(&body), 8192))
    });

    group.bench_function("malformed_lines", |b| {
        let noisy: Vec<u8> = build_body(200)
            .split(|&byte| byte == b'\n')
            .flat_map(|line| [line, b"\n", b"not json\n"].concat())
            .collect();
        b.iter(|| decode_all(black_box(&noisy), 256))
    });

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    group.bench_function("record_1000_tokens", |b| {
        b.iter(|| {
            let mut metrics = SessionMetrics::default();
            for _ in 0..1000 {
                metrics.record_token();
            }
            format_rate(metrics.tokens_per_second(black_box(10.0)))
        })
    });

    group.finish();
}

fn bench_startup(c: &mut Criterion) {
    c.bench_function("config_defaults_validate", |b| {
        b.iter(|| {
            let config = Config::default();
            config.validate().is_ok()
        })
    });
}

// ─── Main ───────────────────────────────────────────────────────────────────

criterion_group!(benches, bench_parser, bench_metrics, bench_startup);
criterion_main!(benches);
