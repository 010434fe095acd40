// src/defaults.rs

// Reference layout
pub const CONTROL_SEQUENCE_SPACING: usize = 20; // ambiguous bases between forward and reverse strands
pub const ALPHABET_SIZE: usize = 5; // A, C, G, T, N
pub const AMBIGUOUS_CODE: u8 = 4;

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 1;
pub const GAP_OPEN_PENALTY: i32 = 4;
pub const GAP_EXTEND_PENALTY: i32 = 1;

// Decision Constants
pub const MIN_CONTROL_SCORE: i32 = 30;
pub const MASK_LEN: usize = 15;
pub const REF_START: usize = 0;

// Other Constants
pub const VERBOSITY: i32 = 3;
pub const BATCH_SIZE: usize = 512;
pub const CONTROL_SPEC: &str = "PhiX,1,40";
