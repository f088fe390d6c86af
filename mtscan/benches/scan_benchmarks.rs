use std::num::NonZeroUsize;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mtscan::processors::spsc;
use mtscan::search::matcher::{BoyerMooreMatcher, MaskedBoyerMooreMatcher, Matcher, NaiveMatcher};
use mtscan::{scan_collect, ScanConfig, Strategy};

fn corpus(lines: usize) -> Vec<u8> {
    let mut text = Vec::new();
    for i in 0..lines {
        let line = format!(
            "line {i} lorem ipsum dolor sit amet pattern_{i} consectetur adipiscing elit\n"
        );
        text.extend_from_slice(line.as_bytes());
    }
    text
}

fn bench_matchers(c: &mut Criterion) {
    let haystack = corpus(200);
    let pattern = b"adipiscing".to_vec();

    let mut group = c.benchmark_group("matcher");
    group.bench_function("boyer_moore_literal", |b| {
        let matcher = BoyerMooreMatcher::new(pattern.clone());
        b.iter(|| black_box(matcher.find_first(black_box(&haystack))));
    });
    group.bench_function("boyer_moore_masked", |b| {
        let matcher = MaskedBoyerMooreMatcher::new(b"adipi?cing".to_vec());
        b.iter(|| black_box(matcher.find_first(black_box(&haystack))));
    });
    group.bench_function("naive", |b| {
        let matcher = NaiveMatcher::new(pattern.clone());
        b.iter(|| black_box(matcher.find_first(black_box(&haystack))));
    });
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let source = Arc::new(corpus(20_000));

    let mut group = c.benchmark_group("strategy");
    for workers in [1usize, 2, 4, 8] {
        for (name, strategy) in [
            ("divide_and_conquer", Strategy::DivideAndConquer),
            ("round_robin", Strategy::RoundRobin),
        ] {
            let config = ScanConfig {
                pattern: "pattern_1?3".to_string(),
                strategy,
                thread_count: NonZeroUsize::new(workers).unwrap(),
                ..ScanConfig::default()
            };
            group.bench_function(format!("{name}_{workers}_threads"), |b| {
                b.iter(|| black_box(scan_collect(Arc::clone(&source), &config).unwrap()));
            });
        }
    }
    group.finish();
}

fn bench_spsc_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.bench_function("push_pop_same_thread", |b| {
        let (mut tx, mut rx) = spsc::channel::<u64>(1024);
        b.iter(|| {
            for i in 0..512u64 {
                tx.try_push(i).ok();
            }
            while let Some(value) = rx.try_pop() {
                black_box(value);
            }
        });
    });
    group.bench_function("cross_thread_handoff", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = spsc::channel::<u64>(1024);
            let consumer = std::thread::spawn(move || {
                let mut received = 0u64;
                while received < 10_000 {
                    if let Some(value) = rx.try_pop() {
                        black_box(value);
                        received += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            });
            for i in 0..10_000u64 {
                let mut item = i;
                loop {
                    match tx.try_push(item) {
                        Ok(()) => break,
                        Err(back) => {
                            item = back;
                            std::hint::spin_loop();
                        }
                    }
                }
            }
            consumer.join().ok();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_matchers, bench_strategies, bench_spsc_queue);
criterion_main!(benches);
