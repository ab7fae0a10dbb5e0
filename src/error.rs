//! Error types for document validation.
//!
//! Every check performed by the rule engine reports its failure as an
//! [`Error`]. Errors fall into the categories of [`ErrorKind`]:
//!
//! - **Structural**: an event is illegal at its position, a marker is
//!   duplicated, or a reference is never resolved
//! - **Limit**: a configured resource limit was exceeded
//! - **Encoding**: invalid UTF-8, malformed identifiers or resource identifiers
//! - **Configuration**: the [`Limits`](crate::Limits) given to the engine are unusable
//!
//! There is no recovery inside a document. After any error the engine must be
//! [reset](crate::RuleEngine::reset) before it accepts another document.
//!
//! ## Examples
//!
//! ```rust
//! use concise_rules::{Event, ErrorKind, Limits, RuleEngine};
//!
//! let mut engine = RuleEngine::new(Limits::default()).unwrap();
//! engine.on_event(&Event::BeginDocument).unwrap();
//! engine.on_event(&Event::Version(1)).unwrap();
//!
//! let err = engine.on_event(&Event::EndContainer).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Structural);
//! assert!(err.to_string().contains("end container"));
//! ```

use crate::identifier::Identifier;
use crate::limits::LimitKind;
use crate::state::SlotKind;
use crate::EventKind;
use thiserror::Error;

/// The category an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Structural,
    Limit,
    Encoding,
    Configuration,
}

/// Represents every way a document (or the engine configuration) can be invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The event is not legal at the current position
    #[error("{event} is not allowed while {slot}")]
    UnexpectedEvent { event: EventKind, slot: SlotKind },

    /// The event stream ended before `EndDocument`
    #[error("document ended while {slot}")]
    IncompleteDocument { slot: SlotKind },

    #[error("unsupported document version {found} (expected {expected})")]
    UnsupportedVersion { expected: u64, found: u64 },

    /// More array data arrived than the chunk header declared
    #[error("array chunk overflow: chunk declared {expected} bytes but received {received}")]
    ChunkOverflow { expected: u64, received: u64 },

    /// A complete array event whose data does not match its element count
    #[error("array declared {expected} bytes but carried {received}")]
    ArrayLengthMismatch { expected: u64, received: u64 },

    #[error("the second part of a concatenated resource identifier must be a single chunk")]
    ConcatContinuation,

    #[error("a concatenated resource identifier cannot be sent as a complete array")]
    ConcatAsCompleteArray,

    #[error("duplicate marker {id}")]
    DuplicateMarker { id: Identifier },

    /// A reference to an already marked object appeared where that object's type is not allowed
    #[error("reference {id} points to an object whose type is not allowed here")]
    ReferenceTypeMismatch { id: Identifier },

    /// A marked object does not satisfy the constraints of earlier references to it
    #[error("marked object {id} does not match the type required by earlier references")]
    ForwardReferenceMismatch { id: Identifier },

    /// Two forward references to the same id appeared in positions with no common type
    #[error("forward references to {id} appear in positions with no common type")]
    ForwardReferenceConflict { id: Identifier },

    #[error("{count} unresolved forward reference(s), first is {id}")]
    UnresolvedReferences { id: Identifier, count: usize },

    #[error("{limit} limit of {max} exceeded")]
    LimitExceeded { limit: LimitKind, max: u64 },

    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("truncated UTF-8 at end of array")]
    TruncatedUtf8,

    #[error("character {ch:?} is not allowed in {context}")]
    DisallowedCharacter { ch: char, context: &'static str },

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid resource identifier: {0}")]
    InvalidResourceId(String),

    #[error("invalid limits: {0}")]
    InvalidLimits(String),
}

impl Error {
    /// Returns the category of this error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_rules::{Error, ErrorKind};
    ///
    /// assert_eq!(Error::TruncatedUtf8.kind(), ErrorKind::Encoding);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedEvent { .. }
            | Error::IncompleteDocument { .. }
            | Error::UnsupportedVersion { .. }
            | Error::ChunkOverflow { .. }
            | Error::ArrayLengthMismatch { .. }
            | Error::ConcatContinuation
            | Error::ConcatAsCompleteArray
            | Error::DuplicateMarker { .. }
            | Error::ReferenceTypeMismatch { .. }
            | Error::ForwardReferenceMismatch { .. }
            | Error::ForwardReferenceConflict { .. }
            | Error::UnresolvedReferences { .. } => ErrorKind::Structural,
            Error::LimitExceeded { .. } => ErrorKind::Limit,
            Error::InvalidUtf8(_)
            | Error::TruncatedUtf8
            | Error::DisallowedCharacter { .. }
            | Error::InvalidIdentifier(_)
            | Error::InvalidResourceId(_) => ErrorKind::Encoding,
            Error::InvalidLimits(_) => ErrorKind::Configuration,
        }
    }

    /// Creates the error raised when `event` is illegal in `slot`.
    pub fn unexpected_event(event: EventKind, slot: SlotKind) -> Self {
        Error::UnexpectedEvent { event, slot }
    }

    /// Creates a limit error.
    pub fn limit(limit: LimitKind, max: u64) -> Self {
        Error::LimitExceeded { limit, max }
    }

    pub fn invalid_utf8<T: Into<String>>(reason: T) -> Self {
        Error::InvalidUtf8(reason.into())
    }

    pub fn invalid_identifier<T: Into<String>>(reason: T) -> Self {
        Error::InvalidIdentifier(reason.into())
    }

    pub fn invalid_resource_id<T: Into<String>>(reason: T) -> Self {
        Error::InvalidResourceId(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::unexpected_event(EventKind::Null, SlotKind::MapKey).kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            Error::limit(LimitKind::ContainerDepth, 3).kind(),
            ErrorKind::Limit
        );
        assert_eq!(
            Error::invalid_identifier("empty").kind(),
            ErrorKind::Encoding
        );
        assert_eq!(
            Error::ArrayLengthMismatch {
                expected: 4,
                received: 2
            }
            .kind(),
            ErrorKind::Structural
        );
        assert_eq!(
            Error::InvalidLimits("zero".into()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_messages_name_the_position() {
        let err = Error::unexpected_event(EventKind::Null, SlotKind::MapKey);
        assert_eq!(err.to_string(), "null is not allowed while awaiting a map key");

        let err = Error::limit(LimitKind::ContainerDepth, 3);
        assert_eq!(err.to_string(), "container depth limit of 3 exceeded");
    }

    #[test]
    fn test_unresolved_message() {
        let err = Error::UnresolvedReferences {
            id: Identifier::Text("x".into()),
            count: 2,
        };
        assert!(err.to_string().contains("\"x\""));
        assert!(err.to_string().starts_with("2 unresolved"));
    }
}
