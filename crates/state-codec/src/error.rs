//! Error types for the state codec crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for codec operations
///
/// A captured failure carried by a [`FailureEnvelope`](crate::FailureEnvelope) is data,
/// never one of these variants.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error on the underlying stream
    #[error("I/O {operation} failed")]
    #[diagnostic(code(cuenv::state_codec::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Operation that failed (e.g., "write length prefix")
        operation: String,
    },

    /// The stream ended before a complete block could be read
    #[error("Truncated block: stream ended inside the {section} ({expected} bytes expected)")]
    #[diagnostic(
        code(cuenv::state_codec::truncated),
        help("The cache entry was cut short; it should be discarded and recomputed")
    )]
    Truncated {
        /// Which part of the block was cut off ("length prefix" or "payload")
        section: &'static str,
        /// Number of bytes the section required
        expected: usize,
    },

    /// A block length exceeds the configured maximum
    #[error("Block of {len} bytes exceeds the maximum of {max} bytes")]
    #[diagnostic(
        code(cuenv::state_codec::block_too_large),
        help("Raise `maxBlockSize` or treat the entry as corrupt")
    )]
    BlockTooLarge {
        /// Length of the offending block
        len: u64,
        /// Configured maximum
        max: u32,
    },

    /// The payload is not a well-formed failure record
    #[error("Malformed failure record: {message}")]
    #[diagnostic(code(cuenv::state_codec::malformed))]
    Malformed {
        /// Description of what was wrong with the record
        message: String,
    },

    /// The captured failure itself cannot be represented by the wire format
    ///
    /// This is fatal for the current record and is never wrapped into another
    /// captured failure.
    #[error("Captured failure cannot be serialized: {reason}")]
    #[diagnostic(
        code(cuenv::state_codec::unrepresentable),
        help("The cache entry cannot be stored; the enclosing write must handle this")
    )]
    Unrepresentable {
        /// Why the failure could not be serialized
        reason: String,
    },

    /// Configuration or validation error
    #[error("Codec configuration error: {message}")]
    #[diagnostic(code(cuenv::state_codec::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create an I/O error
    #[must_use]
    pub fn io(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            operation: operation.into(),
        }
    }

    /// Create a truncation error
    #[must_use]
    pub const fn truncated(section: &'static str, expected: usize) -> Self {
        Self::Truncated { section, expected }
    }

    /// Create a malformed record error
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed {
            message: msg.into(),
        }
    }

    /// Create an unrepresentable failure error
    #[must_use]
    pub fn unrepresentable(reason: impl Into<String>) -> Self {
        Self::Unrepresentable {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Whether this error means the input could not be decoded
    ///
    /// Truncated, oversize and malformed blocks all count as deserialization errors.
    #[must_use]
    pub const fn is_deserialization(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::BlockTooLarge { .. } | Self::Malformed { .. }
        )
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;
