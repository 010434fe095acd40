// tests/scratch_alloc.rs
// Validate that classification scratch (encoded window, query profile, DP
// rows) is released after every call: live heap bytes return to the same
// baseline across 10,000 consecutive classifications.
//
// Kept as the only test in this binary so no other test allocates
// concurrently under the counting allocator.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

use ferrous_control::classifier::{ClassifierParams, ControlFilter, ReadWindow};
use ferrous_control::encoding::reverse_complement;
use ferrous_control::ksw::ReportDepth;
use ferrous_control::reference::build_reference;
use ferrous_control::scoring::build_matrix;

struct CountingAlloc;

static LIVE_BYTES: AtomicIsize = AtomicIsize::new(0);

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let p = unsafe { System.alloc(layout) };
        if !p.is_null() {
            LIVE_BYTES.fetch_add(layout.size() as isize, Ordering::SeqCst);
        }
        p
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        LIVE_BYTES.fetch_sub(layout.size() as isize, Ordering::SeqCst);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let p = unsafe { System.realloc(ptr, layout, new_size) };
        if !p.is_null() {
            LIVE_BYTES.fetch_add(new_size as isize - layout.size() as isize, Ordering::SeqCst);
        }
        p
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn live_bytes() -> isize {
    LIVE_BYTES.load(Ordering::SeqCst)
}

#[test]
fn classification_scratch_does_not_accumulate() {
    // Small control keeps 10,000 debug-build alignments fast
    let control: Vec<u8> = b"GAGTTTTATCGCTTCCATGACGCAGAAGTTAACACTTTCGGATATTTCTGATGAGTCGAAAAATTATCTTGATAAAGCAGGAATTACTACTGCTTGTTTACGAATTAAATCGAAGTGGACTGCTGGCGGAAAATGAGAAAATTCGACCTATCCTTGCGCAGCTCGAGAAGCTCTTACTTTGCGACCTTTCGCCATCAACTAACGATTCTGTCAAAAACTGACGCGTTGGATGAGGAGAAGTGGCTTAATATGCTTGGCACGTTCGTCAAGGACTGGTTTAG".to_vec();
    let reference = build_reference(&control).unwrap();
    let params = ClassifierParams {
        min_score: 15,
        report: ReportDepth::WithStart,
        ..ClassifierParams::default()
    };
    let filter = ControlFilter::new(reference, build_matrix(1, 1), params);

    let forward = control[40..80].to_vec();
    let reverse = reverse_complement(&control[150..190]);
    let unrelated = b"NNNNACGTNNNNTTTTGGGGCCCCAAAANNNNACGTACGT".to_vec();
    let short = b"ACG".to_vec();
    let window = ReadWindow::new(5, 20).unwrap();

    // Warm-up so lazily initialized state is not counted
    let _ = filter.classify(&forward, window);
    let _ = filter.classify(&short, window);

    let baseline = live_bytes();
    let mut n_control = 0usize;
    let mut n_errors = 0usize;

    for i in 0..10_000 {
        let read = match i % 4 {
            0 => &forward,
            1 => &reverse,
            2 => &unrelated,
            _ => &short,
        };
        match filter.classify(read, window) {
            Ok(c) if c.is_control => n_control += 1,
            Ok(_) => {}
            Err(_) => n_errors += 1,
        }
    }

    assert_eq!(
        live_bytes(),
        baseline,
        "live heap bytes changed across 10,000 classifications"
    );
    assert_eq!(n_control, 5_000);
    assert_eq!(n_errors, 2_500);
}
