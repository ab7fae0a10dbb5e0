//! Document Grammar
//!
//! This module documents the event grammar enforced by
//! [`RuleEngine`](crate::RuleEngine).
//!
//! # Overview
//!
//! A document is a sequence of [`Event`](crate::Event)s. The rule engine does
//! not parse bytes; a binary or text decoder (or an application building a
//! document by hand) produces events and the engine decides whether each one
//! is legal where it appears.
//!
//! ```text
//! document  = BeginDocument Version(1) invisible* object invisible* EndDocument
//! object    = prefix* value
//! prefix    = metadata | BeginMarker id
//! value     = scalar | array | list | map | markup | BeginReference ref-id
//! invisible = Padding | comment
//! ```
//!
//! # Positions
//!
//! Every position in a document is a slot on the engine's stack. The slot
//! decides which event classes may come next:
//!
//! | Slot | Accepts |
//! |------|---------|
//! | top level, map value, metadata value, markup attribute value | any object, prefix, reference, invisible |
//! | list item | same, plus `EndContainer` |
//! | map key, metadata key, markup attribute key | keyable object, prefix, reference, invisible, `EndContainer` |
//! | comment item | string, comment, padding, `EndContainer` |
//! | markup contents | string, markup, comment, padding, `EndContainer` |
//! | markup name, marker id | positive integer or string |
//! | reference id | positive integer, string, or resource identifier |
//! | marked object | what the enclosing position accepts, minus markers and references |
//! | after the top-level object | `EndDocument`, invisible |
//!
//! Keyable objects are integers, UIDs, times, strings and resource
//! identifiers. Null, booleans, floats, NaN, typed arrays and containers are
//! objects but never keys.
//!
//! # Containers
//!
//! ## Lists
//!
//! ```text
//! BeginList object* EndContainer
//! ```
//!
//! ## Maps
//!
//! Keys and values alternate. A map ends only at a key position, so an
//! `EndContainer` after a key is an error.
//!
//! ```text
//! BeginMap (key object)* EndContainer
//! ```
//!
//! ## Metadata
//!
//! Metadata is a map that annotates the object following it. It does not
//! count as an object itself; after its `EndContainer` the position still
//! waits for the object, with the same restrictions as before the metadata.
//!
//! ```text
//! BeginMetadata (key object)* EndContainer object
//! ```
//!
//! ## Comments
//!
//! Comments hold strings and nested comments. Comment strings may not contain
//! control characters other than TAB, LF and CR, nor U+2028 and U+2029.
//! Comments are not objects and never complete a position.
//!
//! ## Markup
//!
//! Markup has three phases: a name, attributes (alternating like a map) and
//! contents. The first `EndContainer` ends the attributes; the second ends the
//! markup.
//!
//! ```text
//! BeginMarkup(None) name (key object)* EndContainer content* EndContainer
//! BeginMarkup(Some(name)) (key object)* EndContainer content* EndContainer
//! ```
//!
//! # Arrays
//!
//! An array starts with `BeginArray(kind)` and continues with chunks. Each
//! chunk header declares an element count; its byte length follows from the
//! element width (bit arrays round up to whole bytes). Data may arrive in any
//! number of `ArrayData` events. The array ends with the first chunk whose
//! `more_chunks_follow` is false.
//!
//! ```text
//! BeginArray(kind) (ArrayChunk(n, true) ArrayData*)* ArrayChunk(n, false) ArrayData*
//! ```
//!
//! Strings, resource identifiers and custom text are validated as UTF-8 as
//! they stream, regardless of where chunk boundaries fall. A
//! `ResourceIdConcat` array has two parts: the first is a complete resource
//! identifier, the second is exactly one more chunk.
//!
//! `Event::Array` carries a complete single-chunk array in one event. Its
//! data must fill the declared element count exactly, and it cannot carry a
//! `ResourceIdConcat` array.
//!
//! # Markers and References
//!
//! ```text
//! BeginMarker id object
//! BeginReference id
//! BeginReference resource-id
//! ```
//!
//! Identifiers are positive integers or strings of 1 to 127 bytes made of
//! letters, digits, `_`, `-` and `.`. Integer `1` and string `"1"` are
//! different identifiers.
//!
//! A reference stands in for the marked object and must be legal wherever it
//! appears. References may precede the marker they name; every such forward
//! reference must be resolved before `EndDocument`. A reference given as a
//! resource identifier points outside the document and is accepted as any
//! object, including in key positions.
//!
//! # Limits
//!
//! See [`Limits`](crate::Limits). Exceeding a limit is reported separately
//! from grammar violations.
