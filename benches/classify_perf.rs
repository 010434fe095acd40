// benches/classify_perf.rs
// Criterion benchmarks for per-read control classification and the
// underlying Smith-Waterman scan, at PhiX-like reference size.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

use ferrous_control::classifier::{ClassifierParams, ControlFilter, ReadWindow};
use ferrous_control::encoding::{encode_sequence, reverse_complement};
use ferrous_control::ksw::{KswParams, QueryProfile, ReportDepth, ksw_align};
use ferrous_control::reference::build_reference;
use ferrous_control::scoring::build_matrix;

const CONTROL_LEN: usize = 5386; // PhiX174 genome length

fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

fn bench_classify(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xDEADBEEFCAFEBABE);
    let control = random_dna(&mut rng, CONTROL_LEN);
    let reference = build_reference(&control).unwrap();
    let filter = ControlFilter::new(reference, build_matrix(1, 1), ClassifierParams::default());
    let window = ReadWindow::new(5, 40).unwrap();

    let forward = control[1000..1151].to_vec();
    let reverse = reverse_complement(&control[3000..3151]);
    let unrelated = random_dna(&mut rng, 151);

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(1));
    for (label, read) in [
        ("forward", &forward),
        ("reverse", &reverse),
        ("unrelated", &unrelated),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| black_box(filter.classify(black_box(read), window).unwrap()))
        });
    }
    group.finish();
}

fn bench_ksw(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let mat = build_matrix(1, 1);
    let target = encode_sequence(&random_dna(&mut rng, 2 * CONTROL_LEN + 20));

    let mut group = c.benchmark_group("ksw_align");
    for qlen in [20usize, 40, 80] {
        let query = encode_sequence(&random_dna(&mut rng, qlen));
        let profile = QueryProfile::new(&query, mat.as_slice(), 5).unwrap();
        group.throughput(Throughput::Elements((qlen * target.len()) as u64));

        for (label, report) in [("basic", ReportDepth::Basic), ("with_start", ReportDepth::WithStart)] {
            let params = KswParams {
                gap_open: 4,
                gap_extend: 1,
                report,
                score_floor: 0,
                ref_start: 0,
                mask_len: 15,
            };
            group.bench_function(format!("{label}_len{qlen}"), |b| {
                b.iter(|| black_box(ksw_align(&profile, &target, &params).unwrap()))
            });
        }
    }
    group.finish();
}

fn configure() -> Criterion {
    Criterion::default().sample_size(20)
}

criterion_group! {
    name = benches;
    config = configure();
    targets = bench_classify, bench_ksw
}
criterion_main!(benches);
