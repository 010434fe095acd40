pub mod aligner; // LocalAligner trait and the default Smith-Waterman engine
pub mod classifier; // Per-read control classification
pub mod defaults;
pub mod encoding; // Nucleotide <-> 2-bit(+N) code conversion
pub mod error;
pub mod filter_opt; // Options and control spec parsing
pub mod io;
pub mod ksw; // Query profile + local alignment with affine gaps
pub mod pipeline; // Batched FASTQ filtering
pub mod reference; // Forward + spacer + reverse-complement control reference
pub mod scoring;
