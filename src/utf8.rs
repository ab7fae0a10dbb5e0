//! Streaming UTF-8 validation.
//!
//! Array content arrives in pieces whose boundaries may fall inside a
//! multi-byte code point. [`Utf8Validator`] holds back the bytes of such a
//! split code point (at most three) until the next piece completes it, so the
//! outcome never depends on how the content was chunked.
//!
//! ```rust
//! use concise_rules::utf8::{CharPolicy, Utf8Validator};
//!
//! let bytes = "añb".as_bytes();
//! let mut validator = Utf8Validator::new(CharPolicy::Text);
//! validator.feed(&bytes[..2]).unwrap(); // "a" and the first byte of "ñ"
//! assert!(validator.has_remainder());
//! validator.feed(&bytes[2..]).unwrap();
//! validator.finish().unwrap();
//! ```

use crate::{Error, Result};

/// Which decoded characters are acceptable besides being valid UTF-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CharPolicy {
    /// Any character except NUL.
    #[default]
    Text,
    /// Comment text: no control characters other than TAB, LF and CR, and no
    /// line or paragraph separators.
    Comment,
}

impl CharPolicy {
    fn check(self, ch: char) -> Result<()> {
        let allowed = match self {
            CharPolicy::Text => ch != '\0',
            CharPolicy::Comment => {
                !(ch.is_control() && !matches!(ch, '\t' | '\n' | '\r'))
                    && !matches!(ch, '\u{2028}' | '\u{2029}')
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::DisallowedCharacter {
                ch,
                context: match self {
                    CharPolicy::Text => "text",
                    CharPolicy::Comment => "a comment",
                },
            })
        }
    }
}

/// Validates UTF-8 delivered in arbitrary pieces.
#[derive(Clone, Debug, Default)]
pub struct Utf8Validator {
    pending: [u8; 4],
    pending_len: usize,
    expected_len: usize,
    policy: CharPolicy,
}

impl Utf8Validator {
    #[must_use]
    pub fn new(policy: CharPolicy) -> Self {
        Utf8Validator {
            policy,
            ..Default::default()
        }
    }

    /// Drops any held bytes and switches to `policy`.
    pub fn reset(&mut self, policy: CharPolicy) {
        *self = Self::new(policy);
    }

    /// Returns `true` while the bytes of an incomplete code point are held.
    #[must_use]
    pub fn has_remainder(&self) -> bool {
        self.pending_len > 0
    }

    /// Validates the next piece of content.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid byte sequence or disallowed character.
    pub fn feed(&mut self, mut bytes: &[u8]) -> Result<()> {
        if self.pending_len > 0 {
            let take = (self.expected_len - self.pending_len).min(bytes.len());
            for &byte in &bytes[..take] {
                self.push_continuation(byte)?;
            }
            bytes = &bytes[take..];
            if self.pending_len < self.expected_len {
                return Ok(());
            }
            let ch = self.decode_pending()?;
            self.pending_len = 0;
            self.policy.check(ch)?;
        }

        let (complete, tail) = bytes.split_at(incomplete_tail_start(bytes));
        let text = std::str::from_utf8(complete).map_err(|e| Error::invalid_utf8(e.to_string()))?;
        for ch in text.chars() {
            self.policy.check(ch)?;
        }

        if let Some((&lead, rest)) = tail.split_first() {
            self.pending[0] = lead;
            self.pending_len = 1;
            self.expected_len = sequence_len(lead);
            for &byte in rest {
                self.push_continuation(byte)?;
            }
        }
        Ok(())
    }

    /// Ends the content. Held bytes at this point are a truncated code point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedUtf8`] if an incomplete code point is held.
    pub fn finish(&mut self) -> Result<()> {
        if self.pending_len > 0 {
            self.pending_len = 0;
            return Err(Error::TruncatedUtf8);
        }
        Ok(())
    }

    fn push_continuation(&mut self, byte: u8) -> Result<()> {
        let (low, high) = if self.pending_len == 1 {
            second_byte_range(self.pending[0])
        } else {
            (0x80, 0xBF)
        };
        if !(low..=high).contains(&byte) {
            return Err(Error::invalid_utf8(format!(
                "invalid continuation byte {byte:#04x} after lead byte {:#04x}",
                self.pending[0]
            )));
        }
        self.pending[self.pending_len] = byte;
        self.pending_len += 1;
        Ok(())
    }

    fn decode_pending(&self) -> Result<char> {
        std::str::from_utf8(&self.pending[..self.pending_len])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| Error::invalid_utf8("invalid multi-byte sequence"))
    }
}

/// Length of the sequence introduced by `lead`, or 0 if `lead` cannot start one.
#[inline]
fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Legal range of the byte following `lead`; excludes overlong forms,
/// surrogates and code points above U+10FFFF.
#[inline]
fn second_byte_range(lead: u8) -> (u8, u8) {
    match lead {
        0xE0 => (0xA0, 0xBF),
        0xED => (0x80, 0x9F),
        0xF0 => (0x90, 0xBF),
        0xF4 => (0x80, 0x8F),
        _ => (0x80, 0xBF),
    }
}

/// Index at which a trailing incomplete code point starts, or `bytes.len()`
/// if the buffer does not end inside one.
fn incomplete_tail_start(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for i in (len.saturating_sub(3)..len).rev() {
        let byte = bytes[i];
        if (0x80..=0xBF).contains(&byte) {
            continue;
        }
        let width = sequence_len(byte);
        return if width > len - i { i } else { len };
    }
    len
}
