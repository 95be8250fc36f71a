//! Failure-capturing value codec for the cuenv build-state cache
//!
//! Persisting a snapshot of build state means serializing many heterogeneous
//! values. Some of them cannot be produced or serialized at all. Instead of
//! aborting the whole snapshot, such a value is replaced by a
//! [`FailureEnvelope`] that records the error, and the error is raised again
//! when the value is read back and used.
//!
//! # Wire format
//!
//! An envelope is one length-prefixed block:
//! - 4 bytes: big-endian payload length
//! - N bytes: the [`wire`] encoding of the captured failure (type descriptor,
//!   message, stack frames, cause chain)
//!
//! No header, version tag or checksum is added; versioning belongs to the
//! enclosing cache format.
//!
//! # Example
//!
//! ```
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//! use cuenv_state_codec::{
//!     CapturedFailure, Codec, FailureCapturingCodec, FailureEnvelope, PermissiveResolver,
//!     ReadContext, WriteContext,
//! };
//!
//! let envelope = FailureEnvelope::new(CapturedFailure::new("IllegalStateException", "disk full"));
//!
//! let mut writer = WriteContext::new(Vec::<u8>::new());
//! FailureCapturingCodec.encode(&mut writer, &envelope).await?;
//! let bytes = writer.into_inner();
//!
//! let mut reader = ReadContext::new(&bytes[..], Arc::new(PermissiveResolver));
//! let decoded = FailureCapturingCodec.decode(&mut reader).await?;
//! assert_eq!(decoded.failure().to_string(), "disk full");
//! assert_eq!(decoded.failure().report().to_string(), "IllegalStateException: disk full");
//! # Ok::<(), cuenv_state_codec::Error>(())
//! # }).unwrap();
//! ```

// TODO(state-codec-docs): Add # Errors documentation to all fallible public functions
#![expect(
    clippy::missing_errors_doc,
    reason = "Error documentation to be added incrementally"
)]

pub mod codec;
pub mod config;
pub mod context;
mod error;
pub mod failure;
pub mod value;
pub mod wire;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use codec::{Codec, FailureCapturingCodec, FailureEnvelope};
pub use config::CodecConfig;
pub use context::{LENGTH_PREFIX_SIZE, ReadContext, WriteContext};
pub use failure::{CapturedFailure, FailureReport, FailureType, StackFrame};
pub use value::CachedValue;
pub use wire::{PermissiveResolver, TypeRegistry, TypeResolver};
