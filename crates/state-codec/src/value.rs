//! Cache values as seen by their consumers

use crate::codec::FailureEnvelope;
use crate::failure::CapturedFailure;
use std::error::Error as StdError;

/// A value slot read back from the cache
///
/// A broken slot holds the failure that prevented the value from being
/// stored. [`CachedValue::get`] raises it again where the value is used, with
/// the same diagnostic as the original error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue<T> {
    /// The value was produced and stored
    Present(T),
    /// Producing or serializing the value failed
    Broken(FailureEnvelope),
}

impl<T> CachedValue<T> {
    /// Capture the outcome of producing a value
    pub fn capture<E: StdError + 'static>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Present(value),
            Err(err) => {
                let failure = CapturedFailure::from_error(&err);
                tracing::debug!(
                    failure = %failure.report(),
                    "Captured failure in place of value"
                );
                Self::Broken(FailureEnvelope::new(failure))
            }
        }
    }

    /// Whether this slot holds a captured failure
    pub const fn is_broken(&self) -> bool {
        matches!(self, Self::Broken(_))
    }

    /// Borrow the value, re-raising the captured failure if there is one
    pub fn as_ref(&self) -> std::result::Result<&T, &CapturedFailure> {
        match self {
            Self::Present(value) => Ok(value),
            Self::Broken(envelope) => Err(envelope.failure()),
        }
    }

    /// Take the value, re-raising the captured failure if there is one
    pub fn get(self) -> std::result::Result<T, CapturedFailure> {
        match self {
            Self::Present(value) => Ok(value),
            Self::Broken(envelope) => {
                let failure = envelope.into_failure();
                tracing::debug!(failure = %failure.report(), "Re-raising captured failure");
                Err(failure)
            }
        }
    }
}

impl<T> From<FailureEnvelope> for CachedValue<T> {
    fn from(envelope: FailureEnvelope) -> Self {
        Self::Broken(envelope)
    }
}
