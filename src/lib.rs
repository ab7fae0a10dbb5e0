//! # concise_rules
//!
//! The document rule engine for Concise Encoding.
//!
//! ## What is Concise Encoding?
//!
//! Concise Encoding is a self-describing data format with two syntaxes, a
//! compact binary one and a human-readable text one. Both are decoded into
//! (and encoded from) the same stream of structural events: begin document,
//! version, scalars, container begin and end, chunked arrays, markers,
//! references and end document.
//!
//! This crate validates that stream. It sits between a decoder and whatever
//! consumes the document (a builder, a re-encoder, ...) and guarantees that
//! everything it forwards describes a well-formed document.
//!
//! ## Key Features
//!
//! - **Streaming**: one call per event, no buffering beyond identifier bytes
//! - **Chunk Transparent**: array content and UTF-8 may be split anywhere
//! - **Reference Checking**: markers and forward references are resolved and type-checked
//! - **Bounded**: container depth, object count, lengths and references are all limited
//! - **No Unsafe Code**: written entirely in safe Rust
//!
//! ## Quick Start
//!
//! ```rust
//! use concise_rules::{validate, Event};
//!
//! let document = [
//!     Event::BeginDocument,
//!     Event::Version(1),
//!     Event::BeginList,
//!     Event::PositiveInt(5000),
//!     Event::EndContainer,
//!     Event::EndDocument,
//! ];
//! assert!(validate(&document).is_ok());
//!
//! let unterminated = [
//!     Event::BeginDocument,
//!     Event::Version(1),
//!     Event::BeginList,
//!     Event::EndDocument,
//! ];
//! assert!(validate(&unterminated).is_err());
//! ```
//!
//! ### Markers and References
//!
//! ```rust
//! use concise_rules::{validate, Event};
//!
//! let document = [
//!     Event::BeginDocument,
//!     Event::Version(1),
//!     Event::BeginList,
//!     Event::BeginMarker,
//!     Event::string("a"),
//!     Event::string("x"),
//!     Event::BeginReference,
//!     Event::string("a"),
//!     Event::EndContainer,
//!     Event::EndDocument,
//! ];
//! assert!(validate(&document).is_ok());
//! ```
//!
//! ### Driving the Engine Directly
//!
//! ```rust
//! use concise_rules::{ArrayKind, Event, Limits, RuleEngine};
//!
//! let mut engine = RuleEngine::with_receiver(Limits::strict(), Vec::new()).unwrap();
//! let bytes = "añb".as_bytes();
//! for event in [
//!     Event::BeginDocument,
//!     Event::Version(1),
//!     Event::BeginArray(ArrayKind::String),
//!     Event::ArrayChunk { length: 2, more_chunks_follow: true },
//!     Event::ArrayData(bytes[..2].to_vec()),
//!     Event::ArrayChunk { length: 2, more_chunks_follow: false },
//!     Event::ArrayData(bytes[2..].to_vec()),
//!     Event::EndDocument,
//! ] {
//!     engine.on_event(&event).unwrap();
//! }
//! assert_eq!(engine.into_receiver().len(), 8);
//! ```
//!
//! ## Error Handling
//!
//! The first violation is returned as an [`Error`] whose [`ErrorKind`] is
//! structural, limit, encoding or configuration. An error ends the document;
//! call [`RuleEngine::reset`] before validating another. Events forwarded
//! before the error are not retracted.
//!
//! ## Logging
//!
//! The engine emits [`tracing`] events: `debug` when a document starts, ends
//! or is rejected, and `trace` for every accepted event and reference
//! resolution. Nothing is logged unless a subscriber is installed.
//!
//! ## Grammar
//!
//! See the [`grammar`] module for the full set of rules.

pub mod array;
pub mod engine;
pub mod error;
pub mod event;
pub mod grammar;
pub mod identifier;
pub mod limits;
pub mod receiver;
pub mod registry;
pub mod state;
pub mod utf8;

pub use engine::RuleEngine;
pub use error::{Error, ErrorKind, Result};
pub use event::{ArrayKind, CompactTime, Event, EventClass, EventKind};
pub use identifier::Identifier;
pub use limits::{LimitKind, Limits};
pub use receiver::{Discard, EventReceiver};
pub use state::SlotKind;

/// Validate a complete document with the default [`Limits`].
///
/// # Examples
///
/// ```rust
/// use concise_rules::{validate, Event};
///
/// let events = vec![
///     Event::BeginDocument,
///     Event::Version(1),
///     Event::Null,
///     Event::EndDocument,
/// ];
/// assert!(validate(&events).is_ok());
/// ```
///
/// # Errors
///
/// Returns the first violation, or [`Error::IncompleteDocument`] if the
/// events run out before `EndDocument`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn validate<'a, I>(events: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Event>,
{
    validate_with_limits(Limits::default(), events)
}

/// Validate a complete document with custom limits.
///
/// # Examples
///
/// ```rust
/// use concise_rules::{validate_with_limits, ErrorKind, Event, Limits};
///
/// let events = [
///     Event::BeginDocument,
///     Event::Version(1),
///     Event::BeginList,
///     Event::BeginList,
///     Event::EndContainer,
///     Event::EndContainer,
///     Event::EndDocument,
/// ];
/// let limits = Limits::new().with_max_container_depth(1);
/// let err = validate_with_limits(limits, &events).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Limit);
/// ```
///
/// # Errors
///
/// Returns a configuration error if `limits` is unusable, the first
/// violation in the document, or [`Error::IncompleteDocument`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn validate_with_limits<'a, I>(limits: Limits, events: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut engine = RuleEngine::new(limits)?;
    for event in events {
        engine.on_event(event)?;
    }
    if engine.is_complete() {
        Ok(())
    } else {
        Err(Error::IncompleteDocument {
            slot: engine.slot(),
        })
    }
}
