//! Encoded control reference.
//!
//! The control genome is stored once per run as a single code buffer:
//!
//! ```text
//!   [0, L)          forward strand
//!   [L, L+S)        S ambiguous codes (strand separator)
//!   [L+S, 2L+S)     reverse complement
//! ```
//!
//! Both strands live in one target so a single local alignment searches
//! them together. The separator scores 0 against every base, so no
//! positive-scoring alignment can bridge the two strands.

use crate::defaults::{AMBIGUOUS_CODE, CONTROL_SEQUENCE_SPACING};
use crate::encoding::{base_to_code, complement_code};
use crate::error::{FilterError, Result};

/// Strand of the control reference a hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// Read-only encoded control reference, shared across classification calls.
#[derive(Debug, Clone)]
pub struct ControlReference {
    name: String,
    seq: Vec<u8>,
    strand_len: usize,
    spacing: usize,
}

impl ControlReference {
    /// Name of the control (e.g. `PhiX`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded buffer, `2L + S` codes.
    pub fn as_codes(&self) -> &[u8] {
        &self.seq
    }

    /// Total buffer length (`2L + S`).
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Length of one strand (`L`).
    pub fn strand_len(&self) -> usize {
        self.strand_len
    }

    /// Width of the separator (`S`).
    pub fn spacing(&self) -> usize {
        self.spacing
    }

    /// Start of the reverse-complement strand (`L + S`).
    pub fn reverse_offset(&self) -> usize {
        self.strand_len + self.spacing
    }

    /// Map a buffer coordinate to the strand that holds it.
    ///
    /// Returns `None` inside the separator or past the end of the buffer.
    pub fn strand_of(&self, pos: usize) -> Option<Strand> {
        if pos < self.strand_len {
            Some(Strand::Forward)
        } else if pos >= self.reverse_offset() && pos < self.seq.len() {
            Some(Strand::Reverse)
        } else {
            None
        }
    }

    /// Convert a buffer coordinate to a 0-based position on the forward
    /// genome, regardless of which strand it lies on.
    pub fn forward_position(&self, pos: usize) -> Option<usize> {
        match self.strand_of(pos)? {
            Strand::Forward => Some(pos),
            Strand::Reverse => Some(self.seq.len() - 1 - pos),
        }
    }
}

/// Build the encoded reference with the default separator width.
pub fn build_reference(raw: &[u8]) -> Result<ControlReference> {
    build_reference_with_spacing("control", raw, CONTROL_SEQUENCE_SPACING)
}

/// Build the encoded reference for a named control.
pub fn build_named_reference(name: &str, raw: &[u8]) -> Result<ControlReference> {
    build_reference_with_spacing(name, raw, CONTROL_SEQUENCE_SPACING)
}

/// Build the encoded reference with an explicit separator width.
///
/// The reverse strand is produced by walking `raw` forward and writing from
/// the end of the buffer backwards, complementing each code on the way.
pub fn build_reference_with_spacing(
    name: &str,
    raw: &[u8],
    spacing: usize,
) -> Result<ControlReference> {
    let len = raw.len();
    if len == 0 {
        return Err(FilterError::EmptyReference);
    }

    let total = len
        .checked_mul(2)
        .and_then(|n| n.checked_add(spacing))
        .ok_or(FilterError::Allocation {
            what: "control reference",
            bytes: usize::MAX,
        })?;

    let mut seq: Vec<u8> = Vec::new();
    seq.try_reserve_exact(total)
        .map_err(|e| FilterError::allocation("control reference", total, e))?;
    seq.resize(total, AMBIGUOUS_CODE);

    // forward strand
    for (dst, &base) in seq[..len].iter_mut().zip(raw) {
        *dst = base_to_code(base);
    }

    // [len, len + spacing) keeps the ambiguous fill

    // reverse strand
    for (i, &base) in raw.iter().enumerate() {
        seq[total - 1 - i] = complement_code(base_to_code(base));
    }

    log::debug!(
        "Built control reference '{}': strand={} spacing={} total={}",
        name,
        len,
        spacing,
        total
    );

    Ok(ControlReference {
        name: name.to_string(),
        seq,
        strand_len: len,
        spacing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::reverse_complement;

    #[test]
    fn test_layout_small() {
        let r = build_reference(b"AACGT").unwrap();
        let s = CONTROL_SEQUENCE_SPACING;
        assert_eq!(r.len(), 2 * 5 + s);
        assert_eq!(&r.as_codes()[..5], &[0, 0, 1, 2, 3]);
        assert!(r.as_codes()[5..5 + s].iter().all(|&c| c == AMBIGUOUS_CODE));
        // reverse complement of AACGT is ACGTT
        assert_eq!(&r.as_codes()[5 + s..], &[0, 1, 2, 3, 3]);
    }

    #[test]
    fn test_reverse_strand_matches_ascii_reverse_complement() {
        let raw = b"GATTACANNCGCGTTAG";
        let r = build_reference_with_spacing("t", raw, 3).unwrap();
        let expected: Vec<u8> = reverse_complement(raw)
            .iter()
            .map(|&b| base_to_code(b))
            .collect();
        assert_eq!(&r.as_codes()[r.reverse_offset()..], expected.as_slice());
    }

    #[test]
    fn test_empty_reference_rejected() {
        assert!(matches!(build_reference(b""), Err(FilterError::EmptyReference)));
    }

    #[test]
    fn test_strand_of() {
        let r = build_reference_with_spacing("t", b"ACGTA", 2).unwrap();
        assert_eq!(r.strand_of(0), Some(Strand::Forward));
        assert_eq!(r.strand_of(4), Some(Strand::Forward));
        assert_eq!(r.strand_of(5), None);
        assert_eq!(r.strand_of(6), None);
        assert_eq!(r.strand_of(7), Some(Strand::Reverse));
        assert_eq!(r.strand_of(11), Some(Strand::Reverse));
        assert_eq!(r.strand_of(12), None);
        assert_eq!(r.forward_position(11), Some(0));
        assert_eq!(r.forward_position(7), Some(4));
    }

    #[test]
    fn test_zero_spacing_still_valid() {
        let r = build_reference_with_spacing("t", b"AC", 0).unwrap();
        assert_eq!(r.as_codes(), &[0, 1, 2, 3]);
    }
}
