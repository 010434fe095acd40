//! Control classification of single reads.
//!
//! A read is called "control" when a fixed window of it aligns to the
//! encoded control reference (either strand) with a local alignment score of
//! at least `min_score`. Each call is independent: the window is encoded into
//! a call-local buffer, a query profile is built for it, and both are dropped
//! before returning. The reference and scoring matrix are only read, so one
//! [`ControlFilter`] can be shared across threads without locking.

use crate::aligner::{KswAligner, LocalAligner};
use crate::defaults::{
    ALPHABET_SIZE, GAP_EXTEND_PENALTY, GAP_OPEN_PENALTY, MASK_LEN, MIN_CONTROL_SCORE, REF_START,
};
use crate::encoding::encode_into;
use crate::error::{FilterError, Result};
use crate::ksw::{KswParams, ReportDepth};
use crate::reference::{ControlReference, Strand};
use crate::scoring::ScoreMatrix;

/// A contiguous range of a read: `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadWindow {
    pub start: usize,
    pub length: usize,
}

impl ReadWindow {
    /// Create a window. A zero length is a contract violation.
    pub fn new(start: usize, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(FilterError::EmptyWindow);
        }
        Ok(Self { start, length })
    }

    /// Exclusive end of the window, if it does not overflow.
    pub fn end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }

    /// Borrow the window out of `read`, rejecting out-of-bounds windows.
    pub fn slice<'a>(&self, read: &'a [u8]) -> Result<&'a [u8]> {
        if self.length == 0 {
            return Err(FilterError::EmptyWindow);
        }
        match self.end() {
            Some(end) if end <= read.len() => Ok(&read[self.start..end]),
            _ => Err(FilterError::WindowOutOfBounds {
                start: self.start,
                length: self.length,
                read_len: read.len(),
            }),
        }
    }
}

/// Alignment parameters applied to every classification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierParams {
    /// Minimum local alignment score to call a read "control"
    pub min_score: i32,
    /// Window around the best hit excluded when looking for a secondary hit
    pub mask_len: usize,
    pub gap_open: i32,
    pub gap_extend: i32,
    /// First reference position searched
    pub ref_start: usize,
    pub report: ReportDepth,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            min_score: MIN_CONTROL_SCORE,
            mask_len: MASK_LEN,
            gap_open: GAP_OPEN_PENALTY,
            gap_extend: GAP_EXTEND_PENALTY,
            ref_start: REF_START,
            report: ReportDepth::Basic,
        }
    }
}

impl ClassifierParams {
    fn ksw_params(&self) -> KswParams {
        KswParams {
            gap_open: self.gap_open,
            gap_extend: self.gap_extend,
            report: self.report,
            score_floor: self.min_score,
            ref_start: self.ref_start,
            mask_len: self.mask_len,
        }
    }
}

/// Outcome of classifying one read window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_control: bool,
    /// Best alignment score, `None` when the aligner found nothing
    pub score: Option<i32>,
    /// Best score outside the masked window around the primary hit
    pub secondary_score: Option<i32>,
    /// End of the best hit in reference buffer coordinates
    pub ref_end: Option<usize>,
    /// Start of the best hit, when start recovery was requested
    pub ref_start: Option<usize>,
    /// End of the best hit within the window
    pub query_end: Option<usize>,
    pub strand: Option<Strand>,
}

impl Classification {
    /// Negative result for a window with no alignment at all.
    pub fn no_hit() -> Self {
        Self {
            is_control: false,
            score: None,
            secondary_score: None,
            ref_end: None,
            ref_start: None,
            query_end: None,
            strand: None,
        }
    }
}

fn non_negative(v: i32) -> Option<usize> {
    if v >= 0 { Some(v as usize) } else { None }
}

/// Decide whether `read[window]` comes from the control reference.
///
/// # Arguments
/// * `aligner` - Local alignment engine
/// * `read` - Raw read bases (ASCII)
/// * `window` - Window of the read to align
/// * `reference` - Encoded forward + spacer + reverse-complement reference
/// * `matrix` - 5x5 scoring matrix
/// * `params` - Gap penalties, minimum score and mask length
///
/// # Returns
/// * `Ok(Classification)` - decided, positively or negatively
/// * `Err(_)` - contract violation (bad window) or resource exhaustion;
///   the read could not be classified
pub fn is_control<A: LocalAligner>(
    aligner: &A,
    read: &[u8],
    window: ReadWindow,
    reference: &ControlReference,
    matrix: &ScoreMatrix,
    params: &ClassifierParams,
) -> Result<Classification> {
    let bases = window.slice(read)?;

    let mut codes = Vec::new();
    encode_into(bases, &mut codes)?;

    let profile = aligner.make_profile(&codes, matrix.as_slice(), ALPHABET_SIZE)?;
    let hit = aligner.align(&profile, reference.as_codes(), &params.ksw_params())?;

    let result = match hit {
        None => Classification::no_hit(),
        Some(r) => {
            let ref_end = non_negative(r.te);
            Classification {
                is_control: r.score >= params.min_score,
                score: Some(r.score),
                secondary_score: if r.score2 > 0 { Some(r.score2) } else { None },
                ref_end,
                ref_start: non_negative(r.tb),
                query_end: non_negative(r.qe),
                strand: ref_end.and_then(|te| reference.strand_of(te)),
            }
        }
    };

    log::trace!(
        "window {}+{}: score={:?} control={}",
        window.start,
        window.length,
        result.score,
        result.is_control
    );

    Ok(result)
}

/// Long-lived classification context: the encoded reference, scoring matrix
/// and parameters, built once and then shared read-only.
#[derive(Debug, Clone)]
pub struct ControlFilter<A: LocalAligner = KswAligner> {
    reference: ControlReference,
    matrix: ScoreMatrix,
    params: ClassifierParams,
    aligner: A,
}

impl ControlFilter<KswAligner> {
    /// Create a filter using the built-in Smith-Waterman engine.
    pub fn new(reference: ControlReference, matrix: ScoreMatrix, params: ClassifierParams) -> Self {
        Self::with_aligner(reference, matrix, params, KswAligner)
    }
}

impl<A: LocalAligner> ControlFilter<A> {
    /// Create a filter around a custom alignment engine.
    pub fn with_aligner(
        reference: ControlReference,
        matrix: ScoreMatrix,
        params: ClassifierParams,
        aligner: A,
    ) -> Self {
        Self {
            reference,
            matrix,
            params,
            aligner,
        }
    }

    pub fn reference(&self) -> &ControlReference {
        &self.reference
    }

    pub fn matrix(&self) -> &ScoreMatrix {
        &self.matrix
    }

    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    /// Classify one read window.
    pub fn classify(&self, read: &[u8], window: ReadWindow) -> Result<Classification> {
        is_control(
            &self.aligner,
            read,
            window,
            &self.reference,
            &self.matrix,
            &self.params,
        )
    }

    /// Boolean-only form of [`ControlFilter::classify`].
    pub fn is_control(&self, read: &[u8], window: ReadWindow) -> Result<bool> {
        self.classify(read, window).map(|c| c.is_control)
    }
}
