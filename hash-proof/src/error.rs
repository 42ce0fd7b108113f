// Error taxonomy shared by every stage of the pipeline.
// Only `ConstraintViolation` is an expected outcome (the caller does not know a
// valid preimage); every other kind signals a programming or data defect.

use thiserror::Error;

/// Errors produced while compiling, setting up, proving, verifying or decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// The constraint system was already finalized.
    #[error("constraint system is frozen; no further variables or constraints may be added")]
    FrozenCircuit,

    /// A gadget could not be laid out (bad parameters, dangling variables).
    #[error("gadget construction failed: {0}")]
    Gadget(String),

    /// The R1CS cannot be turned into keys.
    #[error("trusted setup failed: {0}")]
    Setup(String),

    /// The assignment does not satisfy the constraint at `index`.
    #[error("assignment violates constraint #{index}")]
    ConstraintViolation { index: usize },

    /// Witness and key (or circuit) disagree on their layout.
    #[error("witness layout mismatch: expected {expected}, found {found}")]
    WitnessMismatch { expected: String, found: String },

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl Error {
    /// True when the failure only means "this is not a valid preimage".
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation { .. })
    }

    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Error::WitnessMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Malformed verification inputs. A proof that is merely false is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("expected {expected} public inputs, got {found}")]
    PublicInputCount { expected: usize, found: usize },

    #[error("verifying key is malformed: {0}")]
    MalformedKey(String),

    #[error("proof is malformed: {0}")]
    MalformedProof(String),

    #[error("verifying key was derived from a different circuit: {0}")]
    CircuitMismatch(String),
}

/// Failures while decoding serialized artifacts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("unexpected artifact tag {found:?}, expected {expected:?}")]
    WrongTag { expected: String, found: String },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("{0} trailing bytes after artifact")]
    TrailingBytes(usize),

    #[error("invalid element encoding: {0}")]
    InvalidElement(String),

    #[error("artifact is internally inconsistent: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
