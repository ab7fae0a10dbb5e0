//! Byte accounting for the array in progress.
//!
//! An array is announced by `BeginArray`, then delivered as one or more
//! chunks. Each chunk header declares an element count; the data events that
//! follow must add up to exactly that many bytes. [`ArrayAccumulator`] tracks
//! those counts, enforces the byte limit of the array's kind, streams text
//! through the UTF-8 validator, and keeps the bytes of arrays whose content
//! must be inspected once complete (identifiers and resource identifiers).
//!
//! Arrays never nest, so the engine owns exactly one accumulator and reuses it.

use crate::identifier::MAX_IDENTIFIER_BYTES;
use crate::limits::{LimitKind, Limits};
use crate::utf8::{CharPolicy, Utf8Validator};
use crate::{ArrayKind, Error, Result};

/// What the accumulator needs next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// A chunk header.
    Chunk,
    /// More data for the current chunk.
    Data,
    /// Nothing: the array is finished.
    Complete,
}

/// The state of one in-progress array.
#[derive(Debug)]
pub struct ArrayAccumulator {
    kind: ArrayKind,
    limit: LimitKind,
    max_bytes: u64,
    total_bytes: u64,
    chunk_expected: u64,
    chunk_actual: u64,
    more_chunks: bool,
    capture: bool,
    concat_tail: bool,
    buffer: Vec<u8>,
    utf8: Utf8Validator,
}

impl Default for ArrayAccumulator {
    fn default() -> Self {
        ArrayAccumulator {
            kind: ArrayKind::Uint8,
            limit: LimitKind::ArrayLength,
            max_bytes: 0,
            total_bytes: 0,
            chunk_expected: 0,
            chunk_actual: 0,
            more_chunks: false,
            capture: false,
            concat_tail: false,
            buffer: Vec::new(),
            utf8: Utf8Validator::default(),
        }
    }
}

impl ArrayAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new array of `kind`.
    ///
    /// With `capture` set the content is an identifier and is kept for
    /// [`take_buffer`](Self::take_buffer).
    pub fn begin(&mut self, kind: ArrayKind, limits: &Limits, capture: bool, policy: CharPolicy) {
        let limit = match kind {
            ArrayKind::ResourceId | ArrayKind::ResourceIdConcat => LimitKind::ResourceIdLength,
            ArrayKind::String | ArrayKind::CustomText => LimitKind::StringLength,
            _ => LimitKind::ArrayLength,
        };
        self.kind = kind;
        self.limit = limit;
        self.max_bytes = limits.get(limit);
        self.total_bytes = 0;
        self.chunk_expected = 0;
        self.chunk_actual = 0;
        self.more_chunks = false;
        self.capture = capture;
        self.concat_tail = false;
        self.buffer.clear();
        self.utf8.reset(policy);
    }

    #[must_use]
    pub fn kind(&self) -> ArrayKind {
        self.kind
    }

    /// Total bytes declared so far by chunk headers.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Takes the kept content of a finished array.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    fn keeps_content(&self) -> bool {
        self.capture || self.kind.is_resource_id()
    }

    /// Handles a chunk header declaring `element_count` elements.
    ///
    /// # Errors
    ///
    /// Fails if the array would exceed its byte limit, or on a continued
    /// chunk in the second part of a concatenated resource identifier.
    pub fn begin_chunk(&mut self, element_count: u64, more_chunks: bool) -> Result<Progress> {
        if self.concat_tail && more_chunks {
            return Err(Error::ConcatContinuation);
        }
        let chunk_bytes = self
            .kind
            .byte_length(element_count)
            .ok_or_else(|| Error::limit(self.limit, self.max_bytes))?;
        let total = self
            .total_bytes
            .checked_add(chunk_bytes)
            .ok_or_else(|| Error::limit(self.limit, self.max_bytes))?;
        if total > self.max_bytes {
            return Err(Error::limit(self.limit, self.max_bytes));
        }
        if self.capture && total > MAX_IDENTIFIER_BYTES as u64 {
            return Err(Error::invalid_identifier(format!(
                "identifier is {total} bytes long (max {MAX_IDENTIFIER_BYTES})"
            )));
        }

        self.total_bytes = total;
        self.chunk_expected = chunk_bytes;
        self.chunk_actual = 0;
        self.more_chunks = more_chunks;

        if chunk_bytes == 0 {
            return self.finish_chunk();
        }
        Ok(Progress::Data)
    }

    /// Handles a piece of data for the current chunk.
    ///
    /// # Errors
    ///
    /// Fails if the data overflows the chunk, if text content is not valid
    /// UTF-8, or if the finished array fails its completion check.
    pub fn add_data(&mut self, bytes: &[u8]) -> Result<Progress> {
        let received = self.chunk_actual.saturating_add(bytes.len() as u64);
        if received > self.chunk_expected {
            return Err(Error::ChunkOverflow {
                expected: self.chunk_expected,
                received,
            });
        }
        self.chunk_actual = received;

        if self.kind.is_utf8() {
            self.utf8.feed(bytes)?;
        }
        if self.keeps_content() {
            self.buffer.extend_from_slice(bytes);
        }

        if self.chunk_actual == self.chunk_expected {
            self.finish_chunk()
        } else {
            Ok(Progress::Data)
        }
    }

    fn finish_chunk(&mut self) -> Result<Progress> {
        if self.more_chunks {
            return Ok(Progress::Chunk);
        }
        if self.kind.is_utf8() {
            self.utf8.finish()?;
        }
        match self.kind {
            ArrayKind::ResourceId => validate_resource_id(&self.buffer)?,
            ArrayKind::ResourceIdConcat if !self.concat_tail => {
                validate_resource_id(&self.buffer)?;
                // The resource identifier is followed by exactly one more
                // chunk holding the part appended to it.
                self.concat_tail = true;
                return Ok(Progress::Chunk);
            }
            _ => {}
        }
        Ok(Progress::Complete)
    }
}

/// Checks that `bytes` hold an absolute resource identifier.
///
/// # Errors
///
/// Returns an encoding error when the identifier is undersized, has no
/// scheme, or does not parse as a URL.
pub fn validate_resource_id(bytes: &[u8]) -> Result<()> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::invalid_utf8(e.to_string()))?;
    if text.len() < 2 {
        return Err(Error::invalid_resource_id(format!(
            "{text:?} is too short to hold a scheme and colon"
        )));
    }
    let scheme = match text.find(':') {
        Some(colon) => &text[..colon],
        None => {
            return Err(Error::invalid_resource_id(format!("{text:?} has no scheme")));
        }
    };
    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'));
    if !scheme_ok {
        return Err(Error::invalid_resource_id(format!(
            "{text:?} has an invalid scheme"
        )));
    }
    url::Url::parse(text).map_err(|e| Error::invalid_resource_id(format!("{text:?}: {e}")))?;
    Ok(())
}
