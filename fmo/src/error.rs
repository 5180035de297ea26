//! # Error kinds
//!
//! Functions in this crate return [`anyhow::Result`]. Failures that callers may want to tell
//! apart carry one of these kinds, which can be recovered with `downcast_ref::<Error>()`.

use crate::image::Format;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown algorithm name: {0}")]
    NotFound(String),
    #[error("duplicate algorithm name: {0}")]
    Duplicate(String),
    #[error("{op}: unsupported format {format:?}")]
    UnsupportedFormat { op: &'static str, format: Format },
    #[error("failed to perform color conversion from {from:?} to {to:?}")]
    UnsupportedConversion { from: Format, to: Format },
    #[error("format mismatch: expected {expected:?}, got {actual:?}")]
    FormatMismatch { expected: Format, actual: Format },
    #[error("dimensions mismatch: expected {expected:?}, got {actual:?}")]
    DimsMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("invalid configuration: {property} = {value} is outside [{min}; {max}]")]
    InvalidConfig {
        property: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl Error {
    /// Extract the error kind from a generic error, if it carries one.
    pub fn kind_of(err: &anyhow::Error) -> Option<&Self> {
        err.downcast_ref::<Self>()
    }
}
