// Scoring matrix for the 5-letter alignment alphabet (A, C, G, T, N).

use crate::defaults::{ALPHABET_SIZE, AMBIGUOUS_CODE};
use crate::error::{FilterError, Result};

/// Flattened, row-major 5x5 substitution matrix.
///
/// Sign convention: callers hand in the mismatch penalty as a *positive*
/// magnitude; it is stored negated. Any cell touching the ambiguous code is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreMatrix {
    mat: [i8; ALPHABET_SIZE * ALPHABET_SIZE],
}

impl ScoreMatrix {
    /// Score for aligning reference code `a` against query code `b`.
    #[inline(always)]
    pub fn score(&self, a: u8, b: u8) -> i8 {
        self.mat[a as usize * ALPHABET_SIZE + b as usize]
    }

    /// The raw flattened matrix (`m*m` cells, row per reference symbol).
    pub fn as_slice(&self) -> &[i8] {
        &self.mat
    }

    pub fn alphabet_size(&self) -> usize {
        ALPHABET_SIZE
    }

    /// Largest score in the matrix (the match score).
    pub fn max_score(&self) -> i8 {
        self.mat.iter().copied().max().unwrap_or(0)
    }
}

/// Build the substitution matrix.
///
/// Diagonal cells among A/C/G/T get `match_score`, off-diagonal cells among
/// them get `-mismatch_penalty`, and the N row and column are zero.
pub fn build_matrix(match_score: i8, mismatch_penalty: i8) -> ScoreMatrix {
    let mut mat = [0i8; ALPHABET_SIZE * ALPHABET_SIZE];
    let mut k = 0;

    for i in 0..4 {
        for j in 0..4 {
            mat[k] = if i == j {
                match_score
            } else {
                -mismatch_penalty
            };
            k += 1;
        }
        mat[k] = 0; // no penalty for ambiguous base
        k += 1;
    }

    // Last row for N
    for _ in 0..ALPHABET_SIZE {
        mat[k] = 0;
        k += 1;
    }

    debug_assert_eq!(mat[AMBIGUOUS_CODE as usize * ALPHABET_SIZE], 0);
    ScoreMatrix { mat }
}

/// Validated variant of [`build_matrix`] for user-supplied `i32` scores.
pub fn build_matrix_checked(match_score: i32, mismatch_penalty: i32) -> Result<ScoreMatrix> {
    if match_score <= 0 || match_score > i8::MAX as i32 {
        return Err(FilterError::InvalidScoring(format!(
            "match score must be in 1..={}, got {}",
            i8::MAX,
            match_score
        )));
    }
    if mismatch_penalty <= 0 || mismatch_penalty > i8::MAX as i32 {
        return Err(FilterError::InvalidScoring(format!(
            "mismatch penalty must be a positive magnitude in 1..={}, got {}",
            i8::MAX,
            mismatch_penalty
        )));
    }
    Ok(build_matrix(match_score as i8, mismatch_penalty as i8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_layout() {
        let m = build_matrix(2, 3);
        for i in 0..4u8 {
            for j in 0..4u8 {
                let expected = if i == j { 2 } else { -3 };
                assert_eq!(m.score(i, j), expected, "cell ({}, {})", i, j);
            }
        }
        for i in 0..5u8 {
            assert_eq!(m.score(i, 4), 0);
            assert_eq!(m.score(4, i), 0);
        }
        assert_eq!(m.as_slice().len(), 25);
        assert_eq!(m.max_score(), 2);
    }

    #[test]
    fn test_checked_rejects_bad_scores() {
        assert!(build_matrix_checked(1, 1).is_ok());
        assert!(build_matrix_checked(0, 1).is_err());
        assert!(build_matrix_checked(1, -4).is_err());
        assert!(build_matrix_checked(200, 1).is_err());
    }
}
