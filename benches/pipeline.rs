//! Benchmarks for flag resolution.
//!
//! Measures:
//! - Single-file resolution of a component that uses the flag throughout
//! - The absent-flag fast path
//! - Batch processing of a directory
//!
//! Run with: `cargo bench --bench pipeline`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use flagstrip::runner::{self, RunOptions};
use flagstrip::{resolve_flag, FileMatcher, ResolveOptions};

/// React component and service class guarded by `archiveProjects`.
const PROJECTS_PAGE: &str = include_str!("fixtures/projects_page.tsx");

fn options() -> ResolveOptions {
    ResolveOptions::new("archiveProjects")
}

fn bench_single_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_flag");
    group.throughput(Throughput::Bytes(PROJECTS_PAGE.len() as u64));
    let path = Path::new("ProjectsPage.tsx");
    let resolve = options();

    group.bench_function("flagged", |b| {
        b.iter(|| resolve_flag(black_box(PROJECTS_PAGE), path, &resolve).unwrap())
    });

    let unflagged = PROJECTS_PAGE.replace("archiveProjects", "otherFlag");
    group.bench_function("absent_skip", |b| {
        b.iter(|| resolve_flag(black_box(&unflagged), path, &resolve).unwrap())
    });

    let no_skip = options().with_skip_no_flag(false);
    group.bench_function("absent_no_skip", |b| {
        b.iter(|| resolve_flag(black_box(&unflagged), path, &no_skip).unwrap())
    });

    group.finish();
}

fn populate(dir: &Path, count: usize) -> PathBuf {
    for i in 0..count {
        let sub = dir.join(format!("feature_{}", i % 8));
        fs::create_dir_all(&sub).expect("Failed to create fixture dir");
        fs::write(sub.join(format!("Page{i}.tsx")), PROJECTS_PAGE)
            .expect("Failed to write fixture");
    }
    dir.to_path_buf()
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(20);
    let matcher = FileMatcher::default();

    for count in [16usize, 128] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("dry_run_{count}"), |b| {
            b.iter_batched(
                || {
                    let dir = TempDir::new().expect("Failed to create temp dir");
                    let root = populate(dir.path(), count);
                    (dir, root)
                },
                |(_dir, root)| {
                    let run_options = RunOptions::new(options());
                    runner::run(&[root], &matcher, &run_options).unwrap()
                },
                BatchSize::PerIteration,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_file, bench_batch);
criterion_main!(benches);
