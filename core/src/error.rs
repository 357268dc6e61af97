//! Error types produced by the engine core.
//!
//! Construction-time failures (bad config, incomplete catalog, graph /
//! config disagreement) are fatal to the engine instance. Per-request
//! failures are mapped to a [`crate::Status`] on the result instead of
//! aborting a batch.

use thiserror::Error;

use crate::label::ContentType;

/// Errors that can occur while building an engine or identifying an input.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The model configuration document failed validation.
    #[error("invalid model config: {0}")]
    InvalidConfig(String),
    /// A label has no entry in the content-type catalog.
    #[error("no catalog entry for label `{0}`")]
    MissingLabel(ContentType),
    /// The model graph and the configuration disagree on a dimension.
    #[error("model/config mismatch: expected {expected} values, got {actual}")]
    ModelConfigMismatch { expected: usize, actual: usize },
    /// The neural evaluator failed at load or inference time.
    #[error("model runtime error: {0}")]
    ModelRuntime(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
