//! # Nucleotide Encoding
//!
//! Maps ASCII bases onto the 5-letter alignment alphabet shared by the
//! reference builder, the scoring matrix and the local aligner:
//!
//! ```text
//!   A/a -> 0    C/c -> 1    G/g -> 2    T/t/U/u -> 3    anything else -> 4
//! ```
//!
//! Code 4 is the ambiguous symbol. It scores 0 against everything, which is
//! also what makes it usable as the strand separator in the control reference.

use crate::defaults::AMBIGUOUS_CODE;
use crate::error::{FilterError, Result};

// ============================================================================
// LOOKUP TABLE
// ============================================================================
//
// Indexed directly by the input byte, so every one of the 256 values has a
// defined code. Bytes >= 128 fall through to the ambiguous code.
// ============================================================================

/// Byte -> alphabet code lookup table.
pub static BASE_TO_CODE: [u8; 256] = {
    let mut table = [AMBIGUOUS_CODE; 256];
    table[b'A' as usize] = 0;
    table[b'C' as usize] = 1;
    table[b'G' as usize] = 2;
    table[b'T' as usize] = 3;
    table[b'U' as usize] = 3;
    table[b'a' as usize] = 0;
    table[b'c' as usize] = 1;
    table[b'g' as usize] = 2;
    table[b't' as usize] = 3;
    table[b'u' as usize] = 3;
    table
};

/// Complement of each alphabet code (A<->T, C<->G, N->N).
const COMPLEMENT_CODE: [u8; 5] = [3, 2, 1, 0, AMBIGUOUS_CODE];

/// Convert an ASCII base to its alphabet code.
#[inline(always)]
pub fn base_to_code(base: u8) -> u8 {
    BASE_TO_CODE[base as usize]
}

/// Complement of an alphabet code. Out-of-range codes are treated as ambiguous.
#[inline(always)]
pub fn complement_code(code: u8) -> u8 {
    match COMPLEMENT_CODE.get(code as usize) {
        Some(&c) => c,
        None => AMBIGUOUS_CODE,
    }
}

/// Complement of an ASCII base (A<->T, C<->G, everything else -> N).
#[inline]
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' | b'a' => b'T',
        b'C' | b'c' => b'G',
        b'G' | b'g' => b'C',
        b'T' | b't' | b'U' | b'u' => b'A',
        _ => b'N',
    }
}

/// Encode a sequence into a freshly allocated code vector.
pub fn encode_sequence(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| base_to_code(b)).collect()
}

/// Encode `seq` into `out`, replacing its contents.
///
/// The buffer is grown with `try_reserve_exact`, so an allocation failure is
/// reported instead of aborting the process.
pub fn encode_into(seq: &[u8], out: &mut Vec<u8>) -> Result<()> {
    out.clear();
    out.try_reserve_exact(seq.len())
        .map_err(|e| FilterError::allocation("encoded read window", seq.len(), e))?;
    out.extend(seq.iter().map(|&b| base_to_code(b)));
    Ok(())
}

/// Reverse complement of an ASCII sequence.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement_base(b)).collect()
}

// ============================================================================
// UNIT TESTS
// ============================================================================
