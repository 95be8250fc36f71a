//! Exception wire format
//!
//! Encodes a [`CapturedFailure`] as a self-contained JSON record. The cause
//! chain is flattened into a list, outermost first:
//!
//! ```json
//! {"chain":[{"type":"IllegalStateException","message":"disk full","frames":[]}]}
//! ```
//!
//! Flattening keeps both directions iterative, so deep chains never hit the
//! JSON recursion limit. Type descriptors are mapped back to runtime types
//! through a caller-supplied [`TypeResolver`]. Fields this version does not
//! know are ignored, so newer writers can extend the record.

use crate::config::CodecConfig;
use crate::failure::{CapturedFailure, FailureType, StackFrame};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps serialized type descriptors to runtime type descriptors
pub trait TypeResolver: Send + Sync {
    /// Resolve a descriptor, returning the canonical descriptor if it is known
    fn resolve(&self, descriptor: &str) -> Option<String>;
}

/// Resolver that accepts every descriptor as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveResolver;

impl TypeResolver for PermissiveResolver {
    fn resolve(&self, descriptor: &str) -> Option<String> {
        Some(descriptor.to_string())
    }
}

/// Resolver backed by an explicit set of known types and aliases
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    known: HashMap<String, String>,
}

impl TypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its own descriptor
    #[must_use]
    pub fn register(mut self, descriptor: impl Into<String>) -> Self {
        let descriptor = descriptor.into();
        self.known.insert(descriptor.clone(), descriptor);
        self
    }

    /// Resolve `old` to `new`, e.g. for a type that was renamed since the cache was written
    #[must_use]
    pub fn alias(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.known.insert(old.into(), new.into());
        self
    }

    /// Number of descriptors the registry recognises
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Whether the registry recognises nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, descriptor: &str) -> Option<String> {
        self.known.get(descriptor).cloned()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FailureRecord {
    chain: Vec<LinkRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    #[serde(rename = "type")]
    type_descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default)]
    frames: Vec<FrameRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FrameRecord {
    symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

/// Serialize a captured failure, appending the record to `out`
///
/// Fails with [`Error::Unrepresentable`] when the failure has an empty type
/// descriptor or a cause chain deeper than `config.max_cause_depth`. `out` is
/// left untouched on failure.
pub fn serialize(
    failure: &CapturedFailure,
    out: &mut Vec<u8>,
    config: &CodecConfig,
) -> Result<()> {
    let mut chain = Vec::new();
    for (depth, link) in failure.cause_chain().enumerate() {
        if depth >= config.max_cause_depth {
            return Err(Error::unrepresentable(format!(
                "cause chain exceeds the maximum depth of {}",
                config.max_cause_depth
            )));
        }
        let descriptor = link.failure_type.descriptor();
        if descriptor.is_empty() {
            return Err(Error::unrepresentable(format!(
                "failure at depth {depth} has an empty type descriptor"
            )));
        }
        chain.push(LinkRecord {
            type_descriptor: descriptor.to_string(),
            message: link.message.clone(),
            frames: link
                .stack_frames
                .iter()
                .map(|frame| FrameRecord {
                    symbol: frame.symbol.clone(),
                    file: frame.file.clone(),
                    line: frame.line,
                })
                .collect(),
        });
    }

    let bytes = serde_json::to_vec(&FailureRecord { chain })
        .map_err(|e| Error::unrepresentable(e.to_string()))?;
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Deserialize a captured failure from a complete record
///
/// Descriptors the resolver does not know become [`FailureType::Unresolved`].
pub fn deserialize(
    bytes: &[u8],
    resolver: &dyn TypeResolver,
    config: &CodecConfig,
) -> Result<CapturedFailure> {
    let record: FailureRecord =
        serde_json::from_slice(bytes).map_err(|e| Error::malformed(e.to_string()))?;

    if record.chain.is_empty() {
        return Err(Error::malformed("failure record has an empty cause chain"));
    }
    if record.chain.len() > config.max_cause_depth {
        return Err(Error::malformed(format!(
            "cause chain of {} exceeds the maximum depth of {}",
            record.chain.len(),
            config.max_cause_depth
        )));
    }

    let mut links = Vec::with_capacity(record.chain.len());
    for (depth, link) in record.chain.into_iter().enumerate() {
        if link.type_descriptor.is_empty() {
            return Err(Error::malformed(format!(
                "failure at depth {depth} has an empty type descriptor"
            )));
        }
        let failure_type = match resolver.resolve(&link.type_descriptor) {
            Some(resolved) => FailureType::Resolved(resolved),
            None => {
                tracing::debug!(
                    descriptor = %link.type_descriptor,
                    "Unknown failure type, keeping descriptor"
                );
                FailureType::Unresolved(link.type_descriptor)
            }
        };
        links.push(CapturedFailure {
            failure_type,
            message: link.message,
            stack_frames: link
                .frames
                .into_iter()
                .map(|frame| StackFrame {
                    symbol: frame.symbol,
                    file: frame.file,
                    line: frame.line,
                })
                .collect(),
            cause: None,
        });
    }

    Ok(CapturedFailure::chain(links, None))
}
