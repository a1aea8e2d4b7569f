use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use tabular_ingest::ingest::{IngestOptions, Ingestor, SourceFile};
use tempfile::TempDir;

fn generate_sources(files: usize, rows: usize) -> (TempDir, Vec<PathBuf>) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let mut paths = Vec::with_capacity(files);
    for f in 0..files {
        let path = temp_dir.path().join(format!("region_{f}.csv"));
        let mut file = File::create(&path).expect("create csv");
        writeln!(file, "id,region,units,price").expect("header");
        for i in 0..rows {
            let region = match i % 4 {
                0 => "North",
                1 => "South",
                2 => "East",
                _ => "West",
            };
            let units = (i * 7 + f) % 50;
            writeln!(file, "{i},{region},{units},{}.{:02}", i % 90, i % 100).expect("row");
        }
        paths.push(path);
    }
    (temp_dir, paths)
}

fn bench_ingest(c: &mut Criterion) {
    let (temp_dir, paths) = generate_sources(8, 10_000);
    let mut group = c.benchmark_group("ingest_batch");

    for workers in [1, 4] {
        let ingestor = Ingestor::new(IngestOptions {
            workers,
            ..IngestOptions::default()
        })
        .expect("ingestor");
        group.bench_function(format!("csv_8x10k_workers_{workers}"), |b| {
            b.iter_batched(
                || paths.iter().map(SourceFile::from_path).collect::<Vec<_>>(),
                |files| {
                    ingestor.ingest(files).expect("ingest batch");
                },
                BatchSize::SmallInput,
            );
        });
    }

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
