//! The flat status/error taxonomy shared by every layer (§7).
//!
//! Every fallible operation in this crate returns `Result<T, Status>`.
//! A non-OK status short-circuits the caller; when it crosses a control
//! plane channel it is folded into a NACK (see [`crate::control::message`]).

use thiserror::Error;

/// A named error kind. `Fin` is not an error: it is the termination
/// marker the control plane forwards down the tree on shutdown.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Status {
    #[error("termination")]
    Fin,

    #[error("communication error: {0}")]
    Communication(String),

    #[error("received NACK from rank {rank}: {reason}")]
    Nack { rank: u32, reason: String },

    #[error("process initialization failed: {0}")]
    InitFailed(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("configuration: missing key {0}")]
    ConfigMissingKey(String),

    #[error("configuration: invalid value for {key}: {reason}")]
    ConfigInvalidValue { key: String, reason: String },

    #[error("invalid geometry type")]
    InvalidDataType,

    #[error("invalid or malformed geometry")]
    InvalidGeometry,

    #[error("unsupported combination: {0}")]
    UnsupportedCombination(String),

    #[error("missing dataset metadata for id {0}")]
    MissingMetadata(u64),

    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    #[error("partitioning failed: {0}")]
    PartitioningFailed(String),

    #[error("APRIL generation failed: {0}")]
    AprilCreateFailed(String),

    #[error("unexpected APRIL result")]
    AprilUnexpectedResult,

    #[error("invalid query type")]
    InvalidQueryType,

    #[error("invalid result type for this query")]
    InvalidResultType,

    #[error("invalid query input: {0}")]
    InvalidQueryInput(String),

    #[error("dataset {0} not found")]
    UnknownDataset(u64),
}

pub type Result<T> = std::result::Result<T, Status>;

impl Status {
    /// Whether this status represents state corruption serious enough
    /// to abort the containing operation rather than merely skip the
    /// offending pair (§7 Recovery).
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Status::InvalidGeometry | Status::MissingMetadata(_) | Status::UnknownDataset(_)
        )
    }
}
