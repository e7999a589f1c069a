//! Error types for classification engine operations.

use thiserror::Error;

use crate::model::{Axis, ObjectNumber, Voxel};

/// Errors that can occur while synchronizing classification state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Axis value index outside the configured cardinality.
    /// Indicates a programming error in the caller.
    #[error("Invalid value index {index} for {axis} axis (cardinality {cardinality})")]
    InvalidAxisValue {
        /// The axis being encoded
        axis: Axis,
        /// The offending value index
        index: usize,
        /// Number of values the axis accepts
        cardinality: usize,
    },

    /// Flag does not decode to a classification triple
    #[error("Flag {0} is not a classification flag")]
    InvalidFlag(u32),

    /// Voxel flag and tabular record disagree for an object
    #[error("Object {object} is out of sync with its voxel flag {flag}")]
    Desynchronized {
        /// The object whose state disagrees
        object: ObjectNumber,
        /// The flag found at its first voxel
        flag: u32,
    },

    /// Classifier oracle missing or not trained
    #[error("Classifier oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// Object number not present in the current image
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectNumber),

    /// No object covers the given voxel
    #[error("No object at voxel {0}")]
    NoObjectAtVoxel(Voxel),

    /// Operation requires a loaded image
    #[error("No image loaded")]
    NoImageLoaded,

    /// Filter bounds are inverted or not numbers
    #[error("Invalid range [{min}, {max}]")]
    InvalidRange {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Sampling parameters cannot produce a candidate list
    #[error("Invalid sampling request: {0}")]
    InvalidSampling(String),

    /// Traversal worker thread could not be started
    #[error("Failed to spawn traversal worker: {0}")]
    WorkerSpawn(String),

    /// Traversal worker stopped before presenting
    #[error("Traversal worker exited before presenting")]
    WorkerExited,

    /// Axis cardinalities too large for the flag type
    #[error("Axis cardinalities {0:?} need more flags than a flag can hold")]
    FlagRangeOverflow([usize; 3]),
}

impl EngineError {
    /// Create an oracle unavailable error with a reason.
    pub fn oracle_unavailable(reason: impl Into<String>) -> Self {
        Self::OracleUnavailable(reason.into())
    }

    /// Create an invalid sampling error with a reason.
    pub fn invalid_sampling(reason: impl Into<String>) -> Self {
        Self::InvalidSampling(reason.into())
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
