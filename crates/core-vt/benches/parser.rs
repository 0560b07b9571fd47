//! Parser throughput over representative PTY streams.

use core_vt::{Params, Parser, Perform};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

#[derive(Default)]
struct Sink {
    printed: u64,
    dispatched: u64,
}

impl Perform for Sink {
    fn print(&mut self, _c: char) {
        self.printed += 1;
    }
    fn execute(&mut self, _byte: u8) {}
    fn esc_dispatch(&mut self, _intermediates: &[u8], _final_byte: u8) {
        self.dispatched += 1;
    }
    fn csi_dispatch(&mut self, _params: &Params, _intermediates: &[u8], _final_byte: u8) {
        self.dispatched += 1;
    }
    fn osc_dispatch(&mut self, _payload: &[u8], _bel: bool) {
        self.dispatched += 1;
    }
    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _final_byte: u8) {}
    fn put(&mut self, _byte: u8) {}
    fn unhook(&mut self) {}
}

fn stream(kind: &str) -> Vec<u8> {
    match kind {
        "ascii" => b"the quick brown fox jumps over the lazy dog\r\n"
            .iter()
            .cycle()
            .take(64 * 1024)
            .copied()
            .collect(),
        "sgr-heavy" => b"\x1b[1;31mcolor\x1b[0m plain \x1b[38;2;1;2;3mrgb\x1b[m\r\n"
            .iter()
            .cycle()
            .take(64 * 1024)
            .copied()
            .collect(),
        "utf8" => "héllo wörld — 你好 😀\r\n"
            .as_bytes()
            .iter()
            .cycle()
            .take(64 * 1024)
            .copied()
            .collect(),
        _ => unreachable!(),
    }
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    for kind in ["ascii", "sgr-heavy", "utf8"] {
        let bytes = stream(kind);
        group.bench_function(kind, |b| {
            b.iter(|| {
                let mut parser = Parser::new();
                let mut sink = Sink::default();
                parser.advance(&mut sink, black_box(&bytes));
                black_box(sink.printed + sink.dispatched)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);
