pub mod fasta_reader; // Control reference loading
pub mod fastq_reader; // Batched read input
