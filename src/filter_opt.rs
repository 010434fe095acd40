use std::str::FromStr;

use crate::classifier::{ClassifierParams, ReadWindow};
use crate::defaults;
use crate::error::{FilterError, Result};
use crate::ksw::ReportDepth;
use crate::scoring::{ScoreMatrix, build_matrix_checked};

// src/filter_opt.rs
//
// Filter options: scoring, decision threshold and processing parameters.

/// Control filter options
#[derive(Debug, Clone)]
pub struct FilterOpt {
    // Scoring parameters
    pub a: i32,      // Match score
    pub b: i32,      // Mismatch penalty (positive magnitude)
    pub o: i32,      // Gap open penalty
    pub e: i32,      // Gap extension penalty

    // Decision parameters
    pub min_score: i32,      // Minimum alignment score to call a read control
    pub mask_len: usize,     // Mask length for secondary hits
    pub ref_start: usize,    // First reference position searched
    pub report: ReportDepth, // Whether to recover alignment start positions

    // Processing parameters
    pub batch_size: usize, // Reads per batch
    pub n_threads: usize,  // Number of worker threads
    pub verbosity: i32,    // 1=error, 2=warning, 3=message, 4+=debug
}

impl Default for FilterOpt {
    fn default() -> Self {
        Self {
            a: defaults::MATCH_SCORE,
            b: defaults::MISMATCH_PENALTY,
            o: defaults::GAP_OPEN_PENALTY,
            e: defaults::GAP_EXTEND_PENALTY,
            min_score: defaults::MIN_CONTROL_SCORE,
            mask_len: defaults::MASK_LEN,
            ref_start: defaults::REF_START,
            report: ReportDepth::Basic,
            batch_size: defaults::BATCH_SIZE,
            n_threads: 1,
            verbosity: defaults::VERBOSITY,
        }
    }
}

impl FilterOpt {
    /// Check ranges that would make the filter meaningless or crash the aligner.
    pub fn validate(&self) -> Result<()> {
        if self.o < 0 || self.e < 0 {
            return Err(FilterError::InvalidScoring(format!(
                "gap penalties must be non-negative, got -O {} -E {}",
                self.o, self.e
            )));
        }
        if self.min_score <= 0 {
            return Err(FilterError::InvalidScoring(format!(
                "minimum control score must be positive, got {}",
                self.min_score
            )));
        }
        if self.batch_size == 0 {
            return Err(FilterError::InvalidScoring(
                "batch size must be greater than zero".to_string(),
            ));
        }
        // Matrix construction validates the match/mismatch magnitudes
        build_matrix_checked(self.a, self.b)?;
        Ok(())
    }

    /// Warn when no window of this length can ever reach `min_score`.
    pub fn check_window(&self, window: &ReadWindow) {
        let best_possible = (window.length as i64) * (self.a as i64);
        if best_possible < self.min_score as i64 {
            log::warn!(
                "Minimum control score {} is unreachable for a {}-base window (best possible {}); no read will be flagged",
                self.min_score,
                window.length,
                best_possible
            );
        }
    }

    pub fn score_matrix(&self) -> Result<ScoreMatrix> {
        build_matrix_checked(self.a, self.b)
    }

    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            min_score: self.min_score,
            mask_len: self.mask_len,
            gap_open: self.o,
            gap_extend: self.e,
            ref_start: self.ref_start,
            report: self.report,
        }
    }
}

/// Which control to filter and where in each read to look:
/// `NAME,FIRST_CYCLE,LENGTH`, with a 1-based first cycle (e.g. `PhiX,6,40`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSpec {
    pub name: String,
    pub window: ReadWindow,
}

impl FromStr for ControlSpec {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(FilterError::InvalidControlSpec(format!(
                "expected NAME,FIRST_CYCLE,LENGTH: {}",
                s
            )));
        }

        let name = parts[0];
        if name.is_empty() {
            return Err(FilterError::InvalidControlSpec(format!(
                "control name is empty: {}",
                s
            )));
        }

        let first_cycle = parts[1].parse::<usize>().map_err(|_| {
            FilterError::InvalidControlSpec(format!("invalid first cycle: {}", parts[1]))
        })?;
        if first_cycle == 0 {
            return Err(FilterError::InvalidControlSpec(
                "first cycle is 1-based and must be at least 1".to_string(),
            ));
        }

        let length = parts[2].parse::<usize>().map_err(|_| {
            FilterError::InvalidControlSpec(format!("invalid window length: {}", parts[2]))
        })?;
        let window = ReadWindow::new(first_cycle - 1, length).map_err(|_| {
            FilterError::InvalidControlSpec(format!("window length must be positive: {}", s))
        })?;

        Ok(ControlSpec {
            name: name.to_string(),
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        let opt = FilterOpt::default();
        assert!(opt.validate().is_ok());
        let params = opt.classifier_params();
        assert_eq!(params.min_score, defaults::MIN_CONTROL_SCORE);
        assert_eq!(params.gap_open, defaults::GAP_OPEN_PENALTY);
        assert_eq!(params.mask_len, defaults::MASK_LEN);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut opt = FilterOpt::default();
        opt.b = 0;
        assert!(opt.validate().is_err());

        let mut opt = FilterOpt::default();
        opt.o = -1;
        assert!(opt.validate().is_err());

        let mut opt = FilterOpt::default();
        opt.min_score = 0;
        assert!(opt.validate().is_err());
    }

    #[test]
    fn test_parse_control_spec() {
        let spec: ControlSpec = "PhiX,6,40".parse().unwrap();
        assert_eq!(spec.name, "PhiX");
        assert_eq!(spec.window, ReadWindow { start: 5, length: 40 });

        let spec: ControlSpec = defaults::CONTROL_SPEC.parse().unwrap();
        assert_eq!(spec.window.start, 0);
    }

    #[test]
    fn test_parse_control_spec_errors() {
        assert!("PhiX,6".parse::<ControlSpec>().is_err());
        assert!("PhiX,0,40".parse::<ControlSpec>().is_err());
        assert!("PhiX,6,0".parse::<ControlSpec>().is_err());
        assert!("PhiX,x,40".parse::<ControlSpec>().is_err());
        assert!(",6,40".parse::<ControlSpec>().is_err());
        assert!("PhiX,6,40,1".parse::<ControlSpec>().is_err());
    }
}
