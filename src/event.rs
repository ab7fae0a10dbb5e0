//! The document event model.
//!
//! Every Concise Encoding document, whether it was decoded from the binary or
//! the text syntax, is described by the same ordered stream of [`Event`]s.
//! The rule engine consumes that stream one event at a time.
//!
//! ## Core Types
//!
//! - [`Event`]: one unit of document structure (a scalar, a container begin, an array chunk, ...)
//! - [`EventKind`]: the payload-free identity of an event, used in diagnostics
//! - [`ArrayKind`]: the element type of an array and how its content is validated
//! - [`EventClass`]: the semantic classes an event belongs to
//!
//! ## Semantic Classes
//!
//! Legality is decided on classes rather than on individual events. Each slot
//! on the engine's stack carries a mask of allowed classes and an event is
//! accepted iff its class intersects that mask.
//!
//! ```rust
//! use concise_rules::{ArrayKind, Event, EventClass};
//!
//! assert_eq!(Event::PositiveInt(1).class(), EventClass::POSITIVE_INT);
//! assert!(EventClass::KEYABLE.intersects(Event::string("key").class()));
//! assert!(!EventClass::KEYABLE.intersects(Event::BeginList.class()));
//! assert_eq!(Event::BeginArray(ArrayKind::Uint16).class(), EventClass::ARRAY);
//! ```

use bitflags::bitflags;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Semantic classes of events.
    ///
    /// The individual bits name one family of events each. The composite
    /// constants ([`KEYABLE`](Self::KEYABLE), [`ANY_OBJECT`](Self::ANY_OBJECT), ...)
    /// are the masks slots are built from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventClass: u32 {
        const BEGIN_DOCUMENT = 1 << 0;
        const VERSION = 1 << 1;
        const END_DOCUMENT = 1 << 2;
        const PADDING = 1 << 3;
        const COMMENT = 1 << 4;
        const METADATA = 1 << 5;
        const MARKER = 1 << 6;
        const REFERENCE = 1 << 7;
        const NULL = 1 << 8;
        const BOOL = 1 << 9;
        const POSITIVE_INT = 1 << 10;
        const NEGATIVE_INT = 1 << 11;
        const FLOAT = 1 << 12;
        const NAN = 1 << 13;
        const UID = 1 << 14;
        const TIME = 1 << 15;
        const STRING = 1 << 16;
        const RESOURCE_ID = 1 << 17;
        const ARRAY = 1 << 18;
        const LIST = 1 << 19;
        const MAP = 1 << 20;
        const MARKUP = 1 << 21;
        const END_CONTAINER = 1 << 22;
        const ARRAY_CHUNK = 1 << 23;
        const ARRAY_DATA = 1 << 24;

        /// Objects usable as map keys, markup attribute keys and keyable reference targets.
        const KEYABLE = Self::POSITIVE_INT.bits()
            | Self::NEGATIVE_INT.bits()
            | Self::UID.bits()
            | Self::TIME.bits()
            | Self::STRING.bits()
            | Self::RESOURCE_ID.bits();

        /// Every event that forms an object by itself (or begins one).
        const ANY_OBJECT = Self::KEYABLE.bits()
            | Self::NULL.bits()
            | Self::BOOL.bits()
            | Self::FLOAT.bits()
            | Self::NAN.bits()
            | Self::ARRAY.bits()
            | Self::LIST.bits()
            | Self::MAP.bits()
            | Self::MARKUP.bits();

        /// Events that never count as an object: padding and comments.
        const INVISIBLE = Self::PADDING.bits() | Self::COMMENT.bits();

        /// Prefixes that attach to the object that follows them.
        const PREFIX = Self::METADATA.bits() | Self::MARKER.bits();

        /// Values that can name a marker, a reference or a markup element.
        const IDENTIFIER = Self::POSITIVE_INT.bits() | Self::STRING.bits();
    }
}

/// A time value as delivered by the compact time codec.
///
/// The compact form keeps dates and times of day distinct from full
/// timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompactTime {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(DateTime<FixedOffset>),
}

/// One unit of document structure.
///
/// # Examples
///
/// ```rust
/// use concise_rules::{ArrayKind, Event};
///
/// // A string may be delivered as a whole...
/// let whole = Event::string("hello");
///
/// // ...or as a chunked array.
/// let chunked = [
///     Event::BeginArray(ArrayKind::String),
///     Event::ArrayChunk { length: 5, more_chunks_follow: false },
///     Event::ArrayData(b"hello".to_vec()),
/// ];
/// assert_eq!(whole.class(), chunked[0].class());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    BeginDocument,
    Version(u64),
    Padding,
    Null,
    Bool(bool),
    PositiveInt(u64),
    /// A negative integer, carried as its magnitude.
    NegativeInt(u64),
    BigInt(BigInt),
    Float(f64),
    /// A binary float: `significand * 2^exponent`.
    BigFloat {
        significand: BigInt,
        exponent: i64,
    },
    /// A decimal float: `significand * 10^exponent`.
    DecimalFloat {
        significand: i64,
        exponent: i32,
    },
    BigDecimalFloat {
        significand: BigInt,
        exponent: i64,
    },
    NaN {
        signaling: bool,
    },
    Uid([u8; 16]),
    Time(DateTime<FixedOffset>),
    CompactTime(CompactTime),
    BeginList,
    BeginMap,
    /// Begins a markup element. With `None` the name follows as the next
    /// string or positive integer event.
    BeginMarkup(Option<String>),
    BeginMetadata,
    BeginComment,
    BeginMarker,
    BeginReference,
    EndContainer,
    BeginArray(ArrayKind),
    /// Chunk header. `length` counts elements, not bytes.
    ArrayChunk {
        length: u64,
        more_chunks_follow: bool,
    },
    ArrayData(Vec<u8>),
    /// A complete array in a single event: one final chunk holding `data`.
    /// `data` must be exactly as long as `element_count` elements.
    Array {
        kind: ArrayKind,
        element_count: u64,
        data: Vec<u8>,
    },
    EndDocument,
}

impl Event {
    /// Builds a complete string array.
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::utf8_array(ArrayKind::String, value)
    }

    /// Builds a complete resource identifier array.
    #[must_use]
    pub fn resource_id(value: &str) -> Self {
        Self::utf8_array(ArrayKind::ResourceId, value)
    }

    fn utf8_array(kind: ArrayKind, value: &str) -> Self {
        Event::Array {
            kind,
            element_count: value.len() as u64,
            data: value.as_bytes().to_vec(),
        }
    }

    /// Returns the payload-free identity of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Event::BeginDocument => EventKind::BeginDocument,
            Event::Version(_) => EventKind::Version,
            Event::Padding => EventKind::Padding,
            Event::Null => EventKind::Null,
            Event::Bool(_) => EventKind::Bool,
            Event::PositiveInt(_) => EventKind::PositiveInt,
            Event::NegativeInt(_) => EventKind::NegativeInt,
            Event::BigInt(_) => EventKind::BigInt,
            Event::Float(_) => EventKind::Float,
            Event::BigFloat { .. } => EventKind::BigFloat,
            Event::DecimalFloat { .. } => EventKind::DecimalFloat,
            Event::BigDecimalFloat { .. } => EventKind::BigDecimalFloat,
            Event::NaN { .. } => EventKind::NaN,
            Event::Uid(_) => EventKind::Uid,
            Event::Time(_) => EventKind::Time,
            Event::CompactTime(_) => EventKind::CompactTime,
            Event::BeginList => EventKind::BeginList,
            Event::BeginMap => EventKind::BeginMap,
            Event::BeginMarkup(_) => EventKind::BeginMarkup,
            Event::BeginMetadata => EventKind::BeginMetadata,
            Event::BeginComment => EventKind::BeginComment,
            Event::BeginMarker => EventKind::BeginMarker,
            Event::BeginReference => EventKind::BeginReference,
            Event::EndContainer => EventKind::EndContainer,
            Event::BeginArray(_) => EventKind::BeginArray,
            Event::ArrayChunk { .. } => EventKind::ArrayChunk,
            Event::ArrayData(_) => EventKind::ArrayData,
            Event::Array { .. } => EventKind::Array,
            Event::EndDocument => EventKind::EndDocument,
        }
    }

    /// Returns the semantic class of this event.
    ///
    /// Arrays are classified by their element kind and big integers by their sign.
    #[must_use]
    pub fn class(&self) -> EventClass {
        match self {
            Event::BeginDocument => EventClass::BEGIN_DOCUMENT,
            Event::Version(_) => EventClass::VERSION,
            Event::Padding => EventClass::PADDING,
            Event::Null => EventClass::NULL,
            Event::Bool(_) => EventClass::BOOL,
            Event::PositiveInt(_) => EventClass::POSITIVE_INT,
            Event::NegativeInt(_) => EventClass::NEGATIVE_INT,
            Event::BigInt(value) => {
                if value.sign() == Sign::Minus {
                    EventClass::NEGATIVE_INT
                } else {
                    EventClass::POSITIVE_INT
                }
            }
            Event::Float(_)
            | Event::BigFloat { .. }
            | Event::DecimalFloat { .. }
            | Event::BigDecimalFloat { .. } => EventClass::FLOAT,
            Event::NaN { .. } => EventClass::NAN,
            Event::Uid(_) => EventClass::UID,
            Event::Time(_) | Event::CompactTime(_) => EventClass::TIME,
            Event::BeginList => EventClass::LIST,
            Event::BeginMap => EventClass::MAP,
            Event::BeginMarkup(_) => EventClass::MARKUP,
            Event::BeginMetadata => EventClass::METADATA,
            Event::BeginComment => EventClass::COMMENT,
            Event::BeginMarker => EventClass::MARKER,
            Event::BeginReference => EventClass::REFERENCE,
            Event::EndContainer => EventClass::END_CONTAINER,
            Event::BeginArray(kind) | Event::Array { kind, .. } => kind.class(),
            Event::ArrayChunk { .. } => EventClass::ARRAY_CHUNK,
            Event::ArrayData(_) => EventClass::ARRAY_DATA,
            Event::EndDocument => EventClass::END_DOCUMENT,
        }
    }
}

/// The identity of an [`Event`] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeginDocument,
    Version,
    Padding,
    Null,
    Bool,
    PositiveInt,
    NegativeInt,
    BigInt,
    Float,
    BigFloat,
    DecimalFloat,
    BigDecimalFloat,
    NaN,
    Uid,
    Time,
    CompactTime,
    BeginList,
    BeginMap,
    BeginMarkup,
    BeginMetadata,
    BeginComment,
    BeginMarker,
    BeginReference,
    EndContainer,
    BeginArray,
    ArrayChunk,
    ArrayData,
    Array,
    EndDocument,
}

impl EventKind {
    /// Returns a human-readable name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::BeginDocument => "begin document",
            EventKind::Version => "version",
            EventKind::Padding => "padding",
            EventKind::Null => "null",
            EventKind::Bool => "boolean",
            EventKind::PositiveInt => "positive integer",
            EventKind::NegativeInt => "negative integer",
            EventKind::BigInt => "big integer",
            EventKind::Float => "float",
            EventKind::BigFloat => "big float",
            EventKind::DecimalFloat => "decimal float",
            EventKind::BigDecimalFloat => "big decimal float",
            EventKind::NaN => "NaN",
            EventKind::Uid => "UID",
            EventKind::Time => "time",
            EventKind::CompactTime => "compact time",
            EventKind::BeginList => "begin list",
            EventKind::BeginMap => "begin map",
            EventKind::BeginMarkup => "begin markup",
            EventKind::BeginMetadata => "begin metadata",
            EventKind::BeginComment => "begin comment",
            EventKind::BeginMarker => "marker",
            EventKind::BeginReference => "reference",
            EventKind::EndContainer => "end container",
            EventKind::BeginArray => "begin array",
            EventKind::ArrayChunk => "array chunk",
            EventKind::ArrayData => "array data",
            EventKind::Array => "array",
            EventKind::EndDocument => "end document",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The element type of an array.
///
/// The kind decides the array's class, the width of one element, the byte
/// limit that applies, and whether the content must be valid UTF-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayKind {
    String,
    ResourceId,
    /// A resource identifier followed by a second part that is appended to it.
    ResourceIdConcat,
    CustomText,
    CustomBinary,
    Bit,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    Uid,
}

impl ArrayKind {
    /// Width of a single element in bits.
    #[must_use]
    pub const fn element_bits(self) -> u64 {
        match self {
            ArrayKind::Bit => 1,
            ArrayKind::String
            | ArrayKind::ResourceId
            | ArrayKind::ResourceIdConcat
            | ArrayKind::CustomText
            | ArrayKind::CustomBinary
            | ArrayKind::Uint8
            | ArrayKind::Int8 => 8,
            ArrayKind::Uint16 | ArrayKind::Int16 | ArrayKind::Float16 => 16,
            ArrayKind::Uint32 | ArrayKind::Int32 | ArrayKind::Float32 => 32,
            ArrayKind::Uint64 | ArrayKind::Int64 | ArrayKind::Float64 => 64,
            ArrayKind::Uid => 128,
        }
    }

    /// Number of bytes occupied by `element_count` elements, rounded up to a
    /// whole byte. `None` on overflow.
    ///
    /// ```rust
    /// use concise_rules::ArrayKind;
    ///
    /// assert_eq!(ArrayKind::Bit.byte_length(9), Some(2));
    /// assert_eq!(ArrayKind::Uint32.byte_length(3), Some(12));
    /// assert_eq!(ArrayKind::Uid.byte_length(u64::MAX), None);
    /// ```
    #[must_use]
    pub const fn byte_length(self, element_count: u64) -> Option<u64> {
        match element_count.checked_mul(self.element_bits()) {
            Some(bits) => Some(bits / 8 + (bits % 8 != 0) as u64),
            None => None,
        }
    }

    #[must_use]
    pub const fn class(self) -> EventClass {
        match self {
            ArrayKind::String => EventClass::STRING,
            ArrayKind::ResourceId | ArrayKind::ResourceIdConcat => EventClass::RESOURCE_ID,
            _ => EventClass::ARRAY,
        }
    }

    /// Returns `true` if the content of this array must be valid UTF-8.
    #[must_use]
    pub const fn is_utf8(self) -> bool {
        matches!(
            self,
            ArrayKind::String
                | ArrayKind::ResourceId
                | ArrayKind::ResourceIdConcat
                | ArrayKind::CustomText
        )
    }

    /// Returns `true` for the resource identifier kinds.
    #[must_use]
    pub const fn is_resource_id(self) -> bool {
        matches!(self, ArrayKind::ResourceId | ArrayKind::ResourceIdConcat)
    }
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArrayKind::String => "string",
            ArrayKind::ResourceId => "resource identifier",
            ArrayKind::ResourceIdConcat => "concatenated resource identifier",
            ArrayKind::CustomText => "custom text",
            ArrayKind::CustomBinary => "custom binary",
            ArrayKind::Bit => "bit array",
            ArrayKind::Uint8 => "uint8 array",
            ArrayKind::Uint16 => "uint16 array",
            ArrayKind::Uint32 => "uint32 array",
            ArrayKind::Uint64 => "uint64 array",
            ArrayKind::Int8 => "int8 array",
            ArrayKind::Int16 => "int16 array",
            ArrayKind::Int32 => "int32 array",
            ArrayKind::Int64 => "int64 array",
            ArrayKind::Float16 => "float16 array",
            ArrayKind::Float32 => "float32 array",
            ArrayKind::Float64 => "float64 array",
            ArrayKind::Uid => "UID array",
        };
        f.write_str(name)
    }
}
