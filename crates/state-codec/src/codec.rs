//! Codecs and the failure envelope
//!
//! When producing or serializing a cache value fails, the dispatch layer
//! wraps the error in a [`FailureEnvelope`] and writes it with
//! [`FailureCapturingCodec`] instead of the value's own codec. The snapshot
//! stays consistent and the failure is reproduced when the value is read.

use crate::context::{ReadContext, WriteContext};
use crate::failure::CapturedFailure;
use crate::{Result, wire};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Paired encode/decode transform for values of type `T`
#[async_trait]
pub trait Codec<T: Send + Sync>: Send + Sync {
    /// Append `value` to the write context
    async fn encode<W>(&self, ctx: &mut WriteContext<W>, value: &T) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send;

    /// Read one value from the read context
    async fn decode<R>(&self, ctx: &mut ReadContext<R>) -> Result<T>
    where
        R: AsyncRead + Unpin + Send;
}

/// Stand-in for a value whose production or serialization failed
///
/// An envelope always carries a failure; there is no successful envelope.
/// Nothing here tries to recover from the failure, that is up to the
/// consumer (see [`CachedValue`](crate::CachedValue)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEnvelope {
    failure: CapturedFailure,
}

impl FailureEnvelope {
    /// Wrap a captured failure
    #[must_use]
    pub const fn new(failure: CapturedFailure) -> Self {
        Self { failure }
    }

    /// The captured failure
    #[must_use]
    pub const fn failure(&self) -> &CapturedFailure {
        &self.failure
    }

    /// Take ownership of the captured failure
    #[must_use]
    pub fn into_failure(self) -> CapturedFailure {
        self.failure
    }
}

impl From<CapturedFailure> for FailureEnvelope {
    fn from(failure: CapturedFailure) -> Self {
        Self::new(failure)
    }
}

/// Codec for [`FailureEnvelope`] values
///
/// Each envelope is one length-prefixed block whose payload is the
/// [`wire`] encoding of the captured failure. Readers that do not care about
/// the entry can skip the block without parsing it.
///
/// If the wire format cannot represent the captured failure, encoding fails
/// with [`Error::Unrepresentable`](crate::Error::Unrepresentable). That error
/// is returned as-is and never captured into a new envelope, which bounds the
/// recursion at one level.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureCapturingCodec;

#[async_trait]
impl Codec<FailureEnvelope> for FailureCapturingCodec {
    async fn encode<W>(&self, ctx: &mut WriteContext<W>, value: &FailureEnvelope) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut payload = Vec::new();
        wire::serialize(value.failure(), &mut payload, ctx.config())?;
        ctx.write_binary(&payload).await?;

        tracing::debug!(
            failure_type = %value.failure().failure_type,
            depth = value.failure().depth(),
            payload_len = payload.len(),
            "Encoded captured failure"
        );
        Ok(())
    }

    async fn decode<R>(&self, ctx: &mut ReadContext<R>) -> Result<FailureEnvelope>
    where
        R: AsyncRead + Unpin + Send,
    {
        let payload = ctx.read_binary().await?;
        let failure = wire::deserialize(&payload, ctx.resolver(), ctx.config())?;

        tracing::debug!(
            failure_type = %failure.failure_type,
            resolved = failure.failure_type.is_resolved(),
            payload_len = payload.len(),
            "Decoded captured failure"
        );
        Ok(FailureEnvelope::new(failure))
    }
}
