//! This module defines the custom error types for the library.
//!
//! Every fatal condition of a distributed solve is folded into a single public
//! error, [`SorError`], whose [`SorErrorKind`] tells the caller which class of
//! failure stopped the run: a bad configuration detected before any rank starts,
//! a communication failure between ranks, or a rank that panicked.
//!
//! Running out of iterations is not an error. It is reported as
//! [`crate::solvers::Outcome::IterationCapReached`] in the solve report.
use crate::comm::CommError;
use thiserror::Error;

/// Represents all possible errors that can abort a distributed SOR run.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct SorError(#[from] SorErrorKind);

impl SorError {
    /// Returns the kind of failure behind this error.
    pub fn kind(&self) -> &SorErrorKind {
        &self.0
    }

    /// Returns `true` for errors raised while validating the configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.0,
            SorErrorKind::IndivisibleGrid { .. } | SorErrorKind::InvalidParameter(_)
        )
    }
}

impl From<CommError> for SorError {
    fn from(err: CommError) -> Self {
        SorError(SorErrorKind::Communication(err))
    }
}

impl PartialEq for SorError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// The distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub enum SorErrorKind {
    /// The interior size cannot be split into equal row bands.
    #[error("Grid size {size} is not divisible by the worker count {workers}.")]
    IndivisibleGrid { size: usize, workers: usize },

    /// A configuration value is outside its accepted range.
    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    /// A rank could not complete a message exchange with a peer.
    #[error("Communication failure: {0}")]
    Communication(CommError),

    /// A rank thread panicked before finishing its part of the run.
    #[error("Worker rank {rank} panicked.")]
    WorkerPanicked { rank: usize },
}
