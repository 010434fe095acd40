//! Local (Smith-Waterman) alignment with affine gaps against a query profile.
//!
//! Interface follows ksw/SSW: build a query profile once, then align it
//! against an encoded target. The result reports the best score and end
//! coordinates, a secondary score outside a masked window around the best
//! hit, and optionally the start coordinates of the best alignment.
//!
//! Gap model: a gap of length `k` costs `gap_open + (k - 1) * gap_extend`.

use crate::error::{FilterError, Result};

/// How much of the alignment to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportDepth {
    /// Best score, end coordinates and secondary score only
    #[default]
    Basic,
    /// Also recover start coordinates (`tb`, `qb`) when `score >= score_floor`
    WithStart,
}

// Default values for Kswr, mirroring ksw's g_defr
pub const KSW_DEFR: Kswr = Kswr {
    score: 0,
    te: -1,
    qe: -1,
    score2: -1,
    te2: -1,
    tb: -1,
    qb: -1,
};

/// Alignment result. Target coordinates are absolute positions in the
/// reference passed to [`ksw_align`], including any start offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kswr {
    pub score: i32,  // best score
    pub te: i32,     // target end
    pub qe: i32,     // query end
    pub score2: i32, // second best score
    pub te2: i32,    // second best target end
    pub tb: i32,     // target start
    pub qb: i32,     // query start
}

/// Parameters for one [`ksw_align`] call.
#[derive(Debug, Clone, Copy)]
pub struct KswParams {
    pub gap_open: i32,
    pub gap_extend: i32,
    pub report: ReportDepth,
    /// Start coordinates are only recovered for hits at or above this score
    pub score_floor: i32,
    /// First reference position considered
    pub ref_start: usize,
    /// Half-width of the window around the best hit excluded from `score2`
    pub mask_len: usize,
}

/// Precomputed query profile.
///
/// `profile[a * qlen + j]` holds `mat[a * m + query[j]]`, i.e. one row of
/// scores per target symbol, so the inner DP loop reads a contiguous row.
#[derive(Debug)]
pub struct QueryProfile {
    query: Vec<u8>,
    profile: Vec<i32>,
    alphabet: usize,
    max: i32,
}

impl QueryProfile {
    /// Build a profile for `query` (codes `< m`) under the `m*m` matrix `mat`.
    ///
    /// # Arguments
    /// * `query` - Query sequence with 0 <= query[i] < m
    /// * `mat` - `m*m` scoring matrix in a one-dimension array
    /// * `m` - Size of the alphabet
    pub fn new(query: &[u8], mat: &[i8], m: usize) -> Result<Self> {
        if query.is_empty() {
            return Err(FilterError::EmptyWindow);
        }
        if m == 0 || mat.len() != m * m {
            return Err(FilterError::InvalidScoring(format!(
                "matrix has {} cells, expected {} for alphabet of size {}",
                mat.len(),
                m * m,
                m
            )));
        }
        if let Some((position, &code)) = query.iter().enumerate().find(|(_, c)| **c as usize >= m)
        {
            return Err(FilterError::InvalidQuery {
                position,
                code,
                alphabet: m,
            });
        }

        let qlen = query.len();
        let cells = m * qlen;
        let mut profile: Vec<i32> = Vec::new();
        profile
            .try_reserve_exact(cells)
            .map_err(|e| FilterError::allocation("query profile", cells * 4, e))?;
        for a in 0..m {
            let row = &mat[a * m..(a + 1) * m];
            profile.extend(query.iter().map(|&q| row[q as usize] as i32));
        }

        let mut owned_query = Vec::new();
        owned_query
            .try_reserve_exact(qlen)
            .map_err(|e| FilterError::allocation("query profile", qlen, e))?;
        owned_query.extend_from_slice(query);

        let max = mat.iter().copied().max().unwrap_or(0) as i32;

        Ok(Self {
            query: owned_query,
            profile,
            alphabet: m,
            max,
        })
    }

    pub fn qlen(&self) -> usize {
        self.query.len()
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet
    }

    /// Encoded query the profile was built from.
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// Largest single-cell score in the matrix.
    pub fn max_score(&self) -> i32 {
        self.max
    }

    #[inline(always)]
    fn row(&self, symbol: u8) -> Option<&[i32]> {
        let a = symbol as usize;
        if a >= self.alphabet {
            return None;
        }
        let qlen = self.query.len();
        Some(&self.profile[a * qlen..(a + 1) * qlen])
    }
}

/// Outcome of one DP pass over the target.
struct Scan {
    gmax: i32,
    te: i32,
    qe: i32,
    col_max: Vec<i32>,
}

fn alloc_row(len: usize, what: &'static str) -> Result<Vec<i32>> {
    let mut v: Vec<i32> = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| FilterError::allocation(what, len * 4, e))?;
    v.resize(len, 0);
    Ok(v)
}

/// Core DP loop. Equivalent to one pass of `ksw_i16` without striping.
///
/// Stops as soon as the best score reaches `end_score` when given.
/// Column maxima are kept only when `keep_columns` is set.
fn sw_scan(
    profile: &QueryProfile,
    target: &[u8],
    gap_open: i32,
    gap_extend: i32,
    end_score: Option<i32>,
    keep_columns: bool,
) -> Result<Scan> {
    let qlen = profile.qlen();
    let mut h0 = alloc_row(qlen, "alignment DP rows")?;
    let mut h1 = alloc_row(qlen, "alignment DP rows")?;
    let mut e = alloc_row(qlen, "alignment DP rows")?;
    let mut col_max = if keep_columns {
        alloc_row(target.len(), "alignment column maxima")?
    } else {
        Vec::new()
    };

    let mut gmax = 0;
    let mut te = -1;
    let mut qe = -1;

    for (i, &t) in target.iter().enumerate() {
        let row = profile.row(t).ok_or(FilterError::InvalidQuery {
            position: i,
            code: t,
            alphabet: profile.alphabet_size(),
        })?;

        let mut f = 0; // F column for current target row (gap in target)
        let mut h_diag = 0; // H(i-1, j-1)
        let mut imax = 0;
        let mut imax_q = 0;

        for j in 0..qlen {
            let mut h = h_diag + row[j];
            let ej = e[j];
            h = h.max(ej).max(f).max(0);

            h_diag = h0[j];
            h1[j] = h;
            if h > imax {
                imax = h;
                imax_q = j;
            }

            let open = h - gap_open;
            e[j] = (ej - gap_extend).max(open).max(0);
            f = (f - gap_extend).max(open).max(0);
        }

        std::mem::swap(&mut h0, &mut h1);

        if keep_columns {
            col_max[i] = imax;
        }

        if imax > gmax {
            gmax = imax;
            te = i as i32;
            qe = imax_q as i32;
            if let Some(stop) = end_score {
                if gmax >= stop {
                    break;
                }
            }
        }
    }

    Ok(Scan {
        gmax,
        te,
        qe,
        col_max,
    })
}

/// Best column maximum outside `[te - mask_len, te + mask_len]`.
fn secondary_hit(col_max: &[i32], te: usize, mask_len: usize) -> (i32, i32) {
    let low = te.saturating_sub(mask_len);
    let high = te.saturating_add(mask_len);
    let mut score2 = -1;
    let mut te2 = -1;

    for (i, &score) in col_max.iter().enumerate() {
        if i >= low && i <= high {
            continue;
        }
        if score > 0 && score > score2 {
            score2 = score;
            te2 = i as i32;
        }
    }

    (score2, te2)
}

/// Align a query profile against `reference[ref_start..]`.
///
/// Returns `Ok(None)` when no positive-scoring local alignment exists.
/// Errors are reserved for contract violations and allocation failures.
///
/// All scratch buffers are owned by this call and dropped before it returns.
pub fn ksw_align(
    profile: &QueryProfile,
    reference: &[u8],
    params: &KswParams,
) -> Result<Option<Kswr>> {
    if params.gap_open < 0 || params.gap_extend < 0 {
        return Err(FilterError::InvalidScoring(format!(
            "gap penalties must be non-negative magnitudes, got open={} extend={}",
            params.gap_open, params.gap_extend
        )));
    }
    if params.ref_start > reference.len() {
        return Err(FilterError::ReferenceOffset {
            offset: params.ref_start,
            ref_len: reference.len(),
        });
    }

    let target = &reference[params.ref_start..];
    let scan = sw_scan(
        profile,
        target,
        params.gap_open,
        params.gap_extend,
        None,
        true,
    )?;

    if scan.gmax <= 0 {
        return Ok(None);
    }

    let offset = params.ref_start as i32;
    let mut r = KSW_DEFR;
    r.score = scan.gmax;
    r.te = scan.te + offset;
    r.qe = scan.qe;

    let (score2, te2) = secondary_hit(&scan.col_max, scan.te as usize, params.mask_len);
    r.score2 = score2;
    r.te2 = if te2 >= 0 { te2 + offset } else { -1 };

    drop(scan.col_max);

    if params.report == ReportDepth::WithStart && r.score >= params.score_floor {
        // Reverse both prefixes and realign until the forward score is reached
        let qe_len = (scan.qe + 1) as usize;
        let te_len = (scan.te + 1) as usize;

        let rev_query: Vec<u8> = profile.query()[..qe_len].iter().rev().copied().collect();
        let rev_target: Vec<u8> = target[..te_len].iter().rev().copied().collect();

        let mat = profile_matrix(profile);
        let rev_profile = QueryProfile::new(&rev_query, &mat, profile.alphabet_size())?;
        let rr = sw_scan(
            &rev_profile,
            &rev_target,
            params.gap_open,
            params.gap_extend,
            Some(r.score),
            false,
        )?;

        if rr.gmax == r.score {
            r.tb = r.te - rr.te;
            r.qb = r.qe - rr.qe;
        }
    }

    Ok(Some(r))
}

/// Recover the `m*m` matrix from a profile's rows.
///
/// Only cells whose column symbol occurs in the query are observable, which
/// is all the reverse pass needs since it aligns a prefix of the same query.
fn profile_matrix(profile: &QueryProfile) -> Vec<i8> {
    let m = profile.alphabet_size();
    let qlen = profile.qlen();
    let mut mat = vec![0i8; m * m];
    for a in 0..m {
        for (j, &q) in profile.query().iter().enumerate() {
            mat[a * m + q as usize] = profile.profile[a * qlen + j] as i8;
        }
    }
    mat
}
