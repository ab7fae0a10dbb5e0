//! Marker, reference and markup-name identifiers.
//!
//! An identifier is either a positive integer or a short piece of text. Text
//! identifiers must be non-empty, at most [`MAX_IDENTIFIER_BYTES`] long, and
//! consist only of alphanumeric characters, `_`, `-` and `.`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest text identifier accepted, in bytes.
pub const MAX_IDENTIFIER_BYTES: usize = 127;

/// The name of a marked object, a reference target, or a markup element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Int(u64),
    Text(String),
}

impl Identifier {
    /// Validates raw identifier bytes and builds a text identifier from them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use concise_rules::Identifier;
    ///
    /// assert!(Identifier::from_text_bytes(b"node-1.a_b").is_ok());
    /// assert!(Identifier::from_text_bytes(b"").is_err());
    /// assert!(Identifier::from_text_bytes(b"has space").is_err());
    /// ```
    pub fn from_text_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::invalid_identifier("identifier is empty"));
        }
        if bytes.len() > MAX_IDENTIFIER_BYTES {
            return Err(Error::invalid_identifier(format!(
                "identifier is {} bytes long (max {MAX_IDENTIFIER_BYTES})",
                bytes.len()
            )));
        }
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::invalid_utf8(format!("identifier: {e}")))?;
        if let Some(ch) = text.chars().find(|ch| !is_identifier_char(*ch)) {
            return Err(Error::invalid_identifier(format!(
                "character {ch:?} is not allowed in an identifier"
            )));
        }
        Ok(Identifier::Text(text.to_string()))
    }
}

#[inline]
fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(value) => write!(f, "{value}"),
            Identifier::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Identifier::Int(value)
    }
}
