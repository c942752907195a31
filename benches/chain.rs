use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use octadrive::params::ParameterSnapshot;
use octadrive::sim::chain::DistortionChain;
use octadrive::sim::stages::distortion::DistortionAlgorithm;
use std::hint::black_box;

const BUFFER_SIZE: usize = 128;

fn params(algorithm: DistortionAlgorithm) -> ParameterSnapshot {
    ParameterSnapshot {
        drive: 120.0,
        asymmetry: 0.3,
        sub_octave: 0.5,
        dry_wet: 0.9,
        tone: 0.35,
        algorithm,
    }
}

fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stereo block per algorithm");

    for algorithm in DistortionAlgorithm::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &algorithm,
            |b, &algorithm| {
                let mut chain = DistortionChain::new();
                let params = params(algorithm);
                let mut left: Vec<f32> = (0..BUFFER_SIZE).map(|i| (i as f32 * 0.07).sin()).collect();
                let mut right = left.clone();

                b.iter(|| {
                    chain.process_block(
                        black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]),
                        black_box(&params),
                    );
                });
            },
        );
    }

    group.finish();
}

fn bench_sample_vs_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sample vs Block Processing");
    let params = params(DistortionAlgorithm::Tube);

    for &size in &[64usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("sample-by-sample", size), &size, |b, &size| {
            let mut chain = DistortionChain::new();
            let input = vec![0.5f32; size];

            b.iter(|| {
                for &sample in &input {
                    black_box(chain.process(0, black_box(sample), &params));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("block", size), &size, |b, &size| {
            let mut chain = DistortionChain::new();
            let mut buffer = vec![0.5f32; size];

            b.iter(|| {
                chain.process_block(black_box(&mut [buffer.as_mut_slice()]), &params);
                black_box(&buffer);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_algorithms, bench_sample_vs_block);
criterion_main!(benches);
