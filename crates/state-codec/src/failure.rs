//! Captured failure records
//!
//! A [`CapturedFailure`] is the data form of an error that happened while a
//! cache value was produced or serialized: its type descriptor, message,
//! stack frames and cause chain. It can be rebuilt after a round trip through
//! the cache and re-raised as a regular [`std::error::Error`].

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;

/// Descriptor used for sources of a Rust error whose concrete type is not visible
pub const OPAQUE_SOURCE_TYPE: &str = "std::error::Error";

/// Type identity of a captured failure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureType {
    /// Descriptor that the type resolver recognised
    Resolved(String),
    /// Descriptor that could not be resolved; kept verbatim for diagnostics
    Unresolved(String),
}

impl FailureType {
    /// The type descriptor, regardless of resolution
    #[must_use]
    pub fn descriptor(&self) -> &str {
        match self {
            Self::Resolved(d) | Self::Unresolved(d) => d,
        }
    }

    /// Whether the descriptor was recognised at decode time
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor())
    }
}

impl From<&str> for FailureType {
    fn from(descriptor: &str) -> Self {
        Self::Resolved(descriptor.to_string())
    }
}

impl From<String> for FailureType {
    fn from(descriptor: String) -> Self {
        Self::Resolved(descriptor)
    }
}

/// One frame of the stack recorded with a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Function or method symbol
    pub symbol: String,
    /// Source file, if known
    pub file: Option<String>,
    /// Line number within `file`, if known
    pub line: Option<u32>,
}

impl StackFrame {
    /// Create a frame with only a symbol
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            file: None,
            line: None,
        }
    }

    /// Attach a source location
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "at {} ({}:{})", self.symbol, file, line),
            (Some(file), None) => write!(f, "at {} ({})", self.symbol, file),
            _ => write!(f, "at {}", self.symbol),
        }
    }
}

/// An error captured as data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFailure {
    /// Type identity of the failure
    pub failure_type: FailureType,
    /// Human-readable message
    pub message: Option<String>,
    /// Stack frames, innermost call first
    pub stack_frames: Vec<StackFrame>,
    /// The failure that caused this one
    pub cause: Option<Box<CapturedFailure>>,
}

impl CapturedFailure {
    /// Create a failure with a message and no cause
    #[must_use]
    pub fn new(failure_type: impl Into<FailureType>, message: impl Into<String>) -> Self {
        Self {
            failure_type: failure_type.into(),
            message: Some(message.into()),
            stack_frames: Vec::new(),
            cause: None,
        }
    }

    /// Create a failure that carries no message
    #[must_use]
    pub fn without_message(failure_type: impl Into<FailureType>) -> Self {
        Self {
            failure_type: failure_type.into(),
            message: None,
            stack_frames: Vec::new(),
            cause: None,
        }
    }

    /// Set the cause of this failure
    #[must_use]
    pub fn with_cause(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Append a stack frame
    #[must_use]
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack_frames.push(frame);
        self
    }

    /// Capture a Rust error and its `source()` chain
    ///
    /// The outermost failure is described by the Rust type name of `E`. Sources
    /// are only visible as trait objects, so they get [`OPAQUE_SOURCE_TYPE`],
    /// except for sources that are themselves captured failures, which are
    /// copied with their original types.
    #[must_use]
    pub fn from_error<E: StdError + 'static>(error: &E) -> Self {
        let error: &(dyn StdError + 'static) = error;
        if let Some(captured) = error.downcast_ref::<Self>() {
            return captured.clone();
        }

        let mut links = vec![Self::new(type_name::<E>(), error.to_string())];
        let mut tail = None;
        let mut source = error.source();
        while let Some(err) = source {
            if let Some(captured) = err.downcast_ref::<Self>() {
                tail = Some(captured.clone());
                break;
            }
            links.push(Self::new(OPAQUE_SOURCE_TYPE, err.to_string()));
            source = err.source();
        }

        Self::chain(links, tail)
    }

    /// Link a list of failures (outermost first) into one cause chain
    ///
    /// Any cause already set on the links is replaced. `tail` becomes the cause
    /// of the last link.
    pub(crate) fn chain(links: Vec<Self>, tail: Option<Self>) -> Self {
        let mut iter = links.into_iter().rev();
        let mut current = match (iter.next(), tail) {
            (Some(mut innermost), tail) => {
                innermost.cause = tail.map(Box::new);
                innermost
            }
            (None, Some(tail)) => return tail,
            (None, None) => return Self::without_message(OPAQUE_SOURCE_TYPE),
        };
        for mut link in iter {
            link.cause = Some(Box::new(current));
            current = link;
        }
        current
    }

    /// The failure followed by each of its causes, outermost first
    pub fn cause_chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |f| f.cause.as_deref())
    }

    /// Diagnostic view of the cause chain including type descriptors and frames
    #[must_use]
    pub const fn report(&self) -> FailureReport<'_> {
        FailureReport(self)
    }

    /// Number of failures in the cause chain, including this one
    #[must_use]
    pub fn depth(&self) -> usize {
        self.cause_chain().count()
    }

    /// The innermost cause
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        self.cause_chain().last().unwrap_or(self)
    }
}

/// Renders the whole cause chain with type descriptors
///
/// Created by [`CapturedFailure::report`].
#[derive(Debug, Clone, Copy)]
pub struct FailureReport<'a>(&'a CapturedFailure);

impl fmt::Display for FailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, link) in self.0.cause_chain().enumerate() {
            if depth > 0 {
                f.write_str("\ncaused by: ")?;
            }
            match &link.message {
                Some(message) => write!(f, "{}: {}", link.failure_type, message)?,
                None => write!(f, "{}", link.failure_type)?,
            }
            for frame in &link.stack_frames {
                write!(f, "\n    {frame}")?;
            }
        }
        Ok(())
    }
}

/// Shows the message exactly as the original error displayed it
///
/// The type descriptor only appears when there is no message. Use
/// [`CapturedFailure::report`] for output that includes types and frames.
impl fmt::Display for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "{}", self.failure_type),
        }
    }
}

impl StdError for CapturedFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Debug, thiserror::Error)]
    #[error("could not write snapshot")]
    struct SnapshotFailed {
        #[source]
        source: DiskFull,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("replay failed")]
    struct ReplayFailed {
        #[source]
        source: CapturedFailure,
    }

    #[test]
    fn test_display_with_and_without_message() {
        let failure = CapturedFailure::new("IllegalStateException", "disk full");
        assert_eq!(failure.to_string(), "disk full");

        let bare = CapturedFailure::without_message("StackOverflowError");
        assert_eq!(bare.to_string(), "StackOverflowError");
    }

    #[test]
    fn test_source_walks_cause_chain() {
        let failure = CapturedFailure::new("Outer", "outer")
            .with_cause(CapturedFailure::new("Inner", "inner"));

        let source = failure.source().unwrap();
        assert_eq!(source.to_string(), "inner");
        assert!(source.source().is_none());
        assert_eq!(failure.depth(), 2);
        assert_eq!(failure.root_cause().failure_type.descriptor(), "Inner");
    }

    #[test]
    fn test_from_error_captures_sources() {
        let err = SnapshotFailed { source: DiskFull };
        let failure = CapturedFailure::from_error(&err);

        assert!(failure.failure_type.descriptor().ends_with("SnapshotFailed"));
        assert_eq!(failure.message.as_deref(), Some("could not write snapshot"));

        let cause = failure.cause.as_deref().unwrap();
        assert_eq!(cause.failure_type.descriptor(), OPAQUE_SOURCE_TYPE);
        assert_eq!(cause.message.as_deref(), Some("disk full"));
        assert!(cause.cause.is_none());
    }

    #[test]
    fn test_from_error_displays_like_original() {
        let err = SnapshotFailed { source: DiskFull };
        let failure = CapturedFailure::from_error(&err);

        assert_eq!(failure.to_string(), err.to_string());
        assert_eq!(
            failure.source().map(ToString::to_string),
            err.source().map(ToString::to_string)
        );
    }

    #[test]
    fn test_report_includes_types_and_frames() {
        let failure = CapturedFailure::new("Outer", "outer")
            .with_frame(StackFrame::new("run").at("src/lib.rs", 3))
            .with_cause(CapturedFailure::without_message("Inner"));

        assert_eq!(
            failure.report().to_string(),
            "Outer: outer\n    at run (src/lib.rs:3)\ncaused by: Inner"
        );
    }

    #[test]
    fn test_from_error_keeps_captured_source_types() {
        let inner = CapturedFailure::new("IOException", "broken pipe");
        let err = ReplayFailed {
            source: inner.clone(),
        };
        let failure = CapturedFailure::from_error(&err);

        assert_eq!(failure.depth(), 2);
        assert_eq!(failure.cause.as_deref(), Some(&inner));
    }

    #[test]
    fn test_from_error_on_captured_failure_is_clone() {
        let original = CapturedFailure::new("A", "a").with_cause(CapturedFailure::new("B", "b"));
        assert_eq!(CapturedFailure::from_error(&original), original);
    }

    #[test]
    fn test_chain_links_outermost_first() {
        let chained = CapturedFailure::chain(
            vec![CapturedFailure::new("A", "a"), CapturedFailure::new("B", "b")],
            Some(CapturedFailure::new("C", "c")),
        );
        let types: Vec<_> = chained
            .cause_chain()
            .map(|f| f.failure_type.descriptor().to_string())
            .collect();
        assert_eq!(types, ["A", "B", "C"]);
    }

    #[test]
    fn test_stack_frame_display() {
        assert_eq!(StackFrame::new("main").to_string(), "at main");
        assert_eq!(
            StackFrame::new("run").at("src/lib.rs", 12).to_string(),
            "at run (src/lib.rs:12)"
        );
    }

    #[test]
    fn test_failure_type_resolution_flag() {
        assert!(FailureType::from("Known").is_resolved());
        let unresolved = FailureType::Unresolved("Gone".to_string());
        assert!(!unresolved.is_resolved());
        assert_eq!(unresolved.to_string(), "Gone");
    }
}
