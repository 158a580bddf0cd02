use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use core_diff::{ReDiff, UnifiedDiffOptions, unified_diff};

/// Two versions of a synthetic source file: every 13th line edited, a
/// block inserted in the middle.
fn synthetic_sources(lines: usize) -> (String, String) {
    let mut old = String::new();
    let mut new = String::new();
    for i in 0..lines {
        old.push_str(&format!("fn item_{i}() {{ value += {}; }}\n", i % 7));
        if i % 13 == 0 {
            new.push_str(&format!("fn item_{i}() {{ value -= {}; }}\n", i % 7));
        } else {
            new.push_str(&format!("fn item_{i}() {{ value += {}; }}\n", i % 7));
        }
        if i == lines / 2 {
            new.push_str("fn inserted() { }\n\n");
        }
    }
    (old, new)
}

fn bench_diff(c: &mut Criterion) {
    let (old, new) = synthetic_sources(1500);

    c.bench_function("rediff_1500_lines", |b| {
        b.iter(|| {
            let mut diff = ReDiff::new();
            diff.diff_strings(black_box(&old), black_box(&new));
            black_box(diff.chunks_to_vec());
        });
    });

    c.bench_function("unified_diff_1500_lines", |b| {
        let options = UnifiedDiffOptions::new();
        b.iter(|| {
            black_box(unified_diff(
                black_box(&old),
                black_box(&new),
                "expected",
                "actual",
                &options,
            ));
        });
    });
}

criterion_group!(benches, bench_diff);
criterion_main!(benches);
