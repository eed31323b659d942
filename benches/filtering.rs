use std::{fs, io::Cursor, path::PathBuf};

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use maps_filter::{
    DepthConfig, FilterConfig, Mode, Thresholds, filter_positions,
    depth::read_depths,
    position::Reader,
    summarize_depth,
};
use tempfile::{NamedTempFile, tempdir};

const HEADER: &str = "Chrom\tPos\tRef\tCov\tA\tACov\tT\tTCov\tC\tCCov\tG\tGCov\t*\t*Cov\t+\t+Cov\tCall-l1\tCov-l1\tCall-l2\tCov-l2\tCall-l3\tCov-l3\tCall-l4\tCov-l4\n";

fn position_table(records: usize) -> String {
    let mut content = String::from(HEADER);
    for i in 1..=records {
        let mutant = match i % 3 {
            0 => "T_100",
            1 => "A_70-T_30",
            _ => ".",
        };
        content.push_str(&format!(
            "chr1\t{i}\tA\t40\tA\t30\tT\t10\tC\t0\tG\t0\t*\t0\t+\t0\tA_100\t10\tA_100\t10\tA_100\t10\t{mutant}\t10\n"
        ));
    }
    content
}

fn bench_position_parsing(c: &mut Criterion) {
    let data = position_table(1000).into_bytes();

    c.bench_function("position_parsing", |b| {
        b.iter(|| {
            let mut reader = Reader::new(Cursor::new(&data));
            reader.read_header().unwrap();
            for result in reader {
                black_box(&result);
            }
        });
    });
}

fn bench_filter_pipeline(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let input = dir.path().join("positions.txt");
    fs::write(&input, position_table(2000)).unwrap();
    let dir_path = dir.path().to_path_buf();

    let mut group = c.benchmark_group("filter_pipeline");
    for mode in [Mode::Mutation, Mode::Genotyping] {
        group.bench_function(BenchmarkId::new(format!("{mode:?}"), 2000), |b| {
            b.iter_batched(
                || NamedTempFile::new_in(&dir_path).unwrap(),
                |output| {
                    let config = FilterConfig {
                        input: input.clone(),
                        output: output.path().to_path_buf(),
                        mode,
                        thresholds: Thresholds::default(),
                    };
                    black_box(filter_positions(&config).expect("filtering"));
                    output.close().unwrap();
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn depth_files(dir: &tempfile::TempDir, positions: u64) -> (PathBuf, PathBuf) {
    let mut depth = String::new();
    for pos in 0..positions {
        depth.push_str(&format!("chr1\t{pos}\t{}\n", pos % 97));
    }
    let mut windows = String::new();
    for start in (0..positions).step_by(500) {
        windows.push_str(&format!("chr1\t{start}\t{}\n", start + 1000));
    }
    let depth_path = dir.path().join("depth.bed");
    let windows_path = dir.path().join("windows.bed");
    fs::write(&depth_path, depth).unwrap();
    fs::write(&windows_path, windows).unwrap();
    (depth_path, windows_path)
}

fn bench_window_depth(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let (depth, windows) = depth_files(&dir, 50_000);
    let depth_text = fs::read(&depth).unwrap();

    c.bench_function("depth_loading", |b| {
        b.iter(|| black_box(read_depths(Cursor::new(&depth_text)).unwrap()));
    });

    let dir_path = dir.path().to_path_buf();
    c.bench_function("window_summary", |b| {
        b.iter_batched(
            || {
                (
                    NamedTempFile::new_in(&dir_path).unwrap(),
                    NamedTempFile::new_in(&dir_path).unwrap(),
                )
            },
            |(output, global)| {
                let config = DepthConfig {
                    depth: depth.clone(),
                    windows: windows.clone(),
                    output: output.path().to_path_buf(),
                    global_output: global.path().to_path_buf(),
                    aliases: Vec::new(),
                };
                black_box(summarize_depth(&config).expect("window summary"));
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    filtering_benches,
    bench_position_parsing,
    bench_filter_pipeline,
    bench_window_depth
);
criterion_main!(filtering_benches);
