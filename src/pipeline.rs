// Batch filtering of a FASTQ stream
//
// - Batched read loading (Stage 0)
// - Parallel classification using Rayon (Stage 1)
// - Sequential routing to the pass / control outputs (Stage 2)
//
// The ControlFilter is shared read-only across worker threads; every
// classification call owns its own scratch.

use bio::io::fastq;
use rayon::prelude::*;
use std::io::Write;
use std::time::Instant;

use crate::aligner::LocalAligner;
use crate::classifier::{Classification, ControlFilter, ReadWindow};
use crate::error::Result;
use crate::filter_opt::FilterOpt;
use crate::io::fastq_reader::FastqReader;
use crate::reference::Strand;

/// Per-run counters.
///
/// `total = control + passed`; `skipped` counts the passed reads that could
/// not be classified at all (window outside the read, allocation failure).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub control: usize,
    pub passed: usize,
    pub skipped: usize,
    pub forward_hits: usize,
    pub reverse_hits: usize,
}

impl FilterStats {
    fn record(&mut self, outcome: &Result<Classification>) {
        self.total += 1;
        match outcome {
            Ok(c) if c.is_control => {
                self.control += 1;
                match c.strand {
                    Some(Strand::Forward) => self.forward_hits += 1,
                    Some(Strand::Reverse) => self.reverse_hits += 1,
                    None => {}
                }
            }
            Ok(_) => self.passed += 1,
            Err(_) => {
                self.passed += 1;
                self.skipped += 1;
            }
        }
    }

    /// Fraction of reads flagged as control, 0 for an empty run.
    pub fn control_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.control as f64 / self.total as f64
        }
    }
}

/// Filter every read from `reader`.
///
/// Control reads are written to `control_out` (or dropped when it is `None`),
/// all other reads to `pass_out`, both in input order. Reads that cannot be
/// classified are kept in the pass output and counted as skipped.
///
/// # Returns
/// * `Ok(FilterStats)` after the input is exhausted
/// * `Err(_)` on a FASTQ parse error or a write failure
pub fn filter_reads<A: LocalAligner>(
    filter: &ControlFilter<A>,
    window: ReadWindow,
    reader: &mut FastqReader,
    pass_out: &mut dyn Write,
    control_out: Option<&mut dyn Write>,
    opt: &FilterOpt,
) -> Result<FilterStats> {
    let start_time = Instant::now();
    let mut stats = FilterStats::default();
    let mut pass_writer = fastq::Writer::new(pass_out);
    let mut control_writer = control_out.map(fastq::Writer::new);
    let mut n_batches = 0usize;

    loop {
        // Stage 0: load
        let batch = reader.read_batch(opt.batch_size)?;
        if batch.is_empty() {
            break; // EOF
        }
        n_batches += 1;

        // Stage 1: classify
        let outcomes: Vec<Result<Classification>> = batch
            .seqs
            .par_iter()
            .map(|seq| filter.classify(seq, window))
            .collect();

        // Stage 2: route
        let mut batch_control = 0usize;
        for (i, outcome) in outcomes.iter().enumerate() {
            stats.record(outcome);
            match outcome {
                Ok(c) if c.is_control => {
                    batch_control += 1;
                    if let Some(w) = control_writer.as_mut() {
                        w.write_record(&batch.record(i))?;
                    }
                }
                Ok(_) => pass_writer.write_record(&batch.record(i))?,
                Err(e) => {
                    log::debug!("Read {} not classified: {}", batch.names[i], e);
                    pass_writer.write_record(&batch.record(i))?;
                }
            }
        }

        log::debug!(
            "Batch {}: {} reads, {} control",
            n_batches,
            batch.len(),
            batch_control
        );

        if batch.len() < opt.batch_size {
            break; // Last incomplete batch
        }
    }

    pass_writer.flush()?;
    if let Some(w) = control_writer.as_mut() {
        w.flush()?;
    }

    log::info!(
        "Processed {} reads in {:.3} sec: {} control ({:.2}%, {} forward / {} reverse), {} passed, {} skipped",
        stats.total,
        start_time.elapsed().as_secs_f64(),
        stats.control,
        stats.control_fraction() * 100.0,
        stats.forward_hits,
        stats.reverse_hits,
        stats.passed,
        stats.skipped
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    fn hit(is_control: bool, strand: Option<Strand>) -> Result<Classification> {
        Ok(Classification {
            is_control,
            score: Some(if is_control { 40 } else { 10 }),
            strand,
            ..Classification::no_hit()
        })
    }

    #[test]
    fn test_stats_accounting() {
        let mut stats = FilterStats::default();
        stats.record(&hit(true, Some(Strand::Forward)));
        stats.record(&hit(true, Some(Strand::Reverse)));
        stats.record(&hit(false, None));
        stats.record(&Ok(Classification::no_hit()));
        stats.record(&Err(FilterError::EmptyWindow));

        assert_eq!(stats.total, 5);
        assert_eq!(stats.control, 2);
        assert_eq!(stats.passed, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.forward_hits, 1);
        assert_eq!(stats.reverse_hits, 1);
        assert!((stats.control_fraction() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_empty_run_fraction() {
        assert_eq!(FilterStats::default().control_fraction(), 0.0);
    }
}
