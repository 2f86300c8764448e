use chapter_aligner::chapters::similarity::text_similarity;
use chapter_aligner::{analyze, BatchProcessor, ChapterAligner, ConfigBuilder, LocalChapter, RemoteChapter};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Book with `count` chapters; every fifth catalog chapter is missing locally
fn book(count: usize) -> (Vec<LocalChapter>, Vec<RemoteChapter>) {
    let length = 600_000u64;
    let local = (0..count)
        .filter(|i| i % 5 != 4)
        .map(|i| LocalChapter::new(format!("Chapter {}", i + 1), i as u64 * length, (i as u64 + 1) * length))
        .collect();
    let remote = (0..count)
        .map(|i| RemoteChapter::new(format!("The Long Road, Part {}", i + 1), i as u64 * length + 2_500, length))
        .collect();
    (local, remote)
}

/// Benchmark the full alignment at realistic and large chapter counts
fn bench_alignment(c: &mut Criterion) {
    let aligner = ChapterAligner::default();
    let mut group = c.benchmark_group("alignment");

    for count in [20, 100, 300] {
        let (local, remote) = book(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| aligner.align(black_box(&local), black_box(&remote)))
        });
    }

    group.finish();
}

/// Benchmark title similarity
fn bench_text_similarity(c: &mut Criterion) {
    c.bench_function("text_similarity", |b| {
        b.iter(|| {
            text_similarity(
                black_box("Chapter 12: The Storm Breaks"),
                black_box("The Storm Breaks - Part Twelve"),
            )
        })
    });
}

/// Benchmark placeholder analysis
fn bench_placeholder_analysis(c: &mut Criterion) {
    let (local, _) = book(300);

    c.bench_function("placeholder_analysis", |b| b.iter(|| analyze(black_box(&local))));
}

/// Benchmark a small batch run against an empty catalog
fn bench_batch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();

    for n in 0..16 {
        let book_dir = temp_dir.path().join(format!("B{:08}", n));
        std::fs::create_dir_all(&book_dir).unwrap();
        let (local, _) = book(40);
        std::fs::write(book_dir.join("chapters.json"), serde_json::to_string(&local).unwrap()).unwrap();
    }

    let config = ConfigBuilder::new()
        .with_workers(4)
        .with_catalog_dir(temp_dir.path().join("catalog"))
        .build();
    let processor = BatchProcessor::new(config).unwrap();

    c.bench_function("batch_16_books", |b| {
        b.iter(|| rt.block_on(async { processor.process_directory(black_box(temp_dir.path())).await }))
    });
}

criterion_group!(
    benches,
    bench_alignment,
    bench_text_similarity,
    bench_placeholder_analysis,
    bench_batch
);
criterion_main!(benches);
