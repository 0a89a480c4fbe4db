use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hashsweep_core::crypt::CryptSetting;
use hashsweep_core::{HashScheme, Partition, PreparedHasher, SearchSpace, TargetDigest};
use hashsweep_search::{
    partition, CandidateGenerator, ClusterConfig, Coordinator, SearchConfig, Step,
};

fn md5_target(word: &str) -> String {
    hex::encode(HashScheme::Md5.digest(word.as_bytes(), b""))
}

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator");

    let space = SearchSpace::new(1, 4, b'a', b'p');
    let whole = Partition::new(0, b'a', b'p');
    let total = 16 + 16u64.pow(2) + 16u64.pow(3) + 16u64.pow(4);

    group.throughput(Throughput::Elements(total));
    group.bench_function("sweep_16x4", |b| {
        b.iter(|| {
            let mut generator = CandidateGenerator::new(space, &whole);
            let mut probes = 0u64;
            while let Some(step) = generator.next_step() {
                if let Step::Probe(offset) = step {
                    black_box(generator.candidate(offset));
                    probes += 1;
                }
            }
            probes
        })
    });

    group.bench_function("partition_95x64", |b| {
        let space = SearchSpace::default();
        b.iter(|| partition(black_box(64), &space))
    });

    group.finish();
}

fn bench_hashers(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashers");
    let candidate = b"passw0rd";

    for scheme in [HashScheme::Md5, HashScheme::Sha512] {
        let target = TargetDigest::Bytes(vec![0; scheme.digest_len()]);
        let hasher = PreparedHasher::new(scheme, b"salt", target);
        group.bench_with_input(BenchmarkId::new("matches", scheme.name()), &hasher, |b, h| {
            b.iter(|| h.matches(black_box(candidate)))
        });
    }

    let setting = CryptSetting::new(b"saltstring");
    let crypt = PreparedHasher::with_crypt_setting(setting, TargetDigest::Encoded(String::new()));
    group.sample_size(10);
    group.bench_function("matches/shadow", |b| {
        b.iter(|| crypt.matches(black_box(candidate)))
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    let space = SearchSpace::new(1, 4, b'a', b'p');
    for workers in [1, 2, 4] {
        let config = SearchConfig::from_target_str(HashScheme::Md5, &md5_target("zzzz"))
            .unwrap()
            .with_space(space);
        let coordinator = Coordinator::new(config, ClusterConfig::with_workers(workers)).unwrap();
        group.bench_with_input(BenchmarkId::new("md5_exhaust", workers), &coordinator, |b, coord| {
            b.iter(|| coord.run().unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generator, bench_hashers, bench_search);
criterion_main!(benches);
