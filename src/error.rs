//! Error types for the control filter

use std::collections::TryReserveError;
use std::fmt;
use std::io;

/// Result type alias for control filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors raised while building the control reference or classifying reads.
///
/// A read that simply does not align to the control is *not* an error; it is
/// reported as a negative [`Classification`](crate::classifier::Classification).
#[derive(Debug)]
pub enum FilterError {
    /// The control sequence has no bases
    EmptyReference,

    /// Memory for a buffer could not be reserved
    Allocation {
        /// Which buffer was being allocated
        what: &'static str,
        /// Requested size in bytes
        bytes: usize,
    },

    /// A read window of length zero was requested
    EmptyWindow,

    /// The read window does not fit inside the read
    WindowOutOfBounds {
        start: usize,
        length: usize,
        read_len: usize,
    },

    /// The alignment start offset lies past the end of the reference
    ReferenceOffset { offset: usize, ref_len: usize },

    /// Scoring parameters are out of range
    InvalidScoring(String),

    /// A query code falls outside the profile alphabet
    InvalidQuery {
        position: usize,
        code: u8,
        alphabet: usize,
    },

    /// Malformed `NAME,FIRST_CYCLE,LENGTH` control specification
    InvalidControlSpec(String),

    /// The requested control record is missing from the reference file
    ControlNotFound(String),

    /// I/O error
    Io(io::Error),
}

impl FilterError {
    /// Wrap a failed `try_reserve*` call.
    pub(crate) fn allocation(what: &'static str, bytes: usize, _source: TryReserveError) -> Self {
        FilterError::Allocation { what, bytes }
    }

    /// True for errors caused by the caller passing an unusable read window.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            FilterError::EmptyWindow | FilterError::WindowOutOfBounds { .. }
        )
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::EmptyReference => write!(f, "control sequence is empty"),
            FilterError::Allocation { what, bytes } => {
                write!(f, "failed to allocate {} bytes for {}", bytes, what)
            }
            FilterError::EmptyWindow => write!(f, "read window length must be greater than zero"),
            FilterError::WindowOutOfBounds {
                start,
                length,
                read_len,
            } => write!(
                f,
                "read window {}+{} exceeds read length {}",
                start, length, read_len
            ),
            FilterError::ReferenceOffset { offset, ref_len } => write!(
                f,
                "reference start offset {} exceeds reference length {}",
                offset, ref_len
            ),
            FilterError::InvalidScoring(msg) => write!(f, "invalid scoring parameters: {}", msg),
            FilterError::InvalidQuery {
                position,
                code,
                alphabet,
            } => write!(
                f,
                "query code {} at position {} is outside alphabet of size {}",
                code, position, alphabet
            ),
            FilterError::InvalidControlSpec(msg) => {
                write!(f, "invalid control specification: {}", msg)
            }
            FilterError::ControlNotFound(name) => {
                write!(f, "control sequence '{}' not found in reference", name)
            }
            FilterError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FilterError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FilterError {
    fn from(error: io::Error) -> Self {
        FilterError::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_classification() {
        assert!(FilterError::EmptyWindow.is_contract_violation());
        assert!(
            FilterError::WindowOutOfBounds {
                start: 10,
                length: 40,
                read_len: 30
            }
            .is_contract_violation()
        );
        assert!(
            !FilterError::Allocation {
                what: "scratch",
                bytes: 64
            }
            .is_contract_violation()
        );
    }

    #[test]
    fn test_display_messages() {
        let err = FilterError::WindowOutOfBounds {
            start: 5,
            length: 40,
            read_len: 30,
        };
        assert_eq!(err.to_string(), "read window 5+40 exceeds read length 30");
        assert_eq!(
            FilterError::ControlNotFound("PhiX".into()).to_string(),
            "control sequence 'PhiX' not found in reference"
        );
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;
        let err: FilterError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(err.source().is_some());
    }
}
