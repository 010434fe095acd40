// Local alignment capability used by the control classifier.
//
// The classifier only needs two operations: turn an encoded query into a
// profile, and align that profile against the encoded reference.

use crate::error::Result;
use crate::ksw::{KswParams, Kswr, QueryProfile, ksw_align};

/// A local-alignment engine.
///
/// Implementations must be `Sync`: one engine instance is shared by every
/// worker thread classifying reads.
pub trait LocalAligner: Sync {
    /// Per-query precomputed state. Dropped by the caller after one read.
    type Profile;

    /// Build a query profile for `query` (codes `< alphabet`) under `matrix`.
    fn make_profile(&self, query: &[u8], matrix: &[i8], alphabet: usize)
    -> Result<Self::Profile>;

    /// Best local alignment of `profile` against `reference`.
    ///
    /// `Ok(None)` means no alignment was found; it is not an error.
    fn align(
        &self,
        profile: &Self::Profile,
        reference: &[u8],
        params: &KswParams,
    ) -> Result<Option<Kswr>>;
}

/// Scalar affine-gap Smith-Waterman from [`crate::ksw`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KswAligner;

impl LocalAligner for KswAligner {
    type Profile = QueryProfile;

    fn make_profile(&self, query: &[u8], matrix: &[i8], alphabet: usize) -> Result<QueryProfile> {
        QueryProfile::new(query, matrix, alphabet)
    }

    fn align(
        &self,
        profile: &QueryProfile,
        reference: &[u8],
        params: &KswParams,
    ) -> Result<Option<Kswr>> {
        ksw_align(profile, reference, params)
    }
}

impl<A: LocalAligner> LocalAligner for &A {
    type Profile = A::Profile;

    fn make_profile(&self, query: &[u8], matrix: &[i8], alphabet: usize)
    -> Result<Self::Profile> {
        (**self).make_profile(query, matrix, alphabet)
    }

    fn align(
        &self,
        profile: &Self::Profile,
        reference: &[u8],
        params: &KswParams,
    ) -> Result<Option<Kswr>> {
        (**self).align(profile, reference, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ksw::ReportDepth;
    use crate::scoring::build_matrix;

    #[test]
    fn test_ksw_aligner_delegates() {
        let aligner = KswAligner;
        let mat = build_matrix(1, 1);
        let profile = aligner.make_profile(&[0, 1, 2, 3], mat.as_slice(), 5).unwrap();
        let params = KswParams {
            gap_open: 4,
            gap_extend: 1,
            report: ReportDepth::Basic,
            score_floor: 0,
            ref_start: 0,
            mask_len: 15,
        };
        let hit = (&aligner)
            .align(&profile, &[3, 3, 0, 1, 2, 3, 3], &params)
            .unwrap()
            .unwrap();
        assert_eq!(hit.score, 4);
        assert_eq!(hit.te, 5);
    }
}
