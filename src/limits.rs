//! Resource limits for document validation.
//!
//! [`Limits`] is supplied once when a [`RuleEngine`](crate::RuleEngine) is
//! built. Exceeding any of them while validating a document raises a
//! limit error, which is reported separately from structural violations.
//!
//! ## Examples
//!
//! ```rust
//! use concise_rules::{Limits, RuleEngine};
//!
//! let limits = Limits::new()
//!     .with_max_container_depth(16)
//!     .with_max_string_byte_length(4096);
//! let engine = RuleEngine::new(limits).unwrap();
//!
//! // Every limit must be at least 1.
//! assert!(RuleEngine::new(Limits::new().with_max_object_count(0)).is_err());
//! ```
//!
//! Limits also deserialize from any serde format; missing fields keep their
//! defaults:
//!
//! ```rust
//! use concise_rules::Limits;
//!
//! let limits: Limits = serde_json::from_str(r#"{"max_container_depth": 8}"#).unwrap();
//! assert_eq!(limits.max_container_depth, 8);
//! assert_eq!(limits.max_object_count, Limits::default().max_object_count);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the limits in [`Limits`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitKind {
    ContainerDepth,
    ObjectCount,
    StringLength,
    ArrayLength,
    ResourceIdLength,
    ReferenceCount,
}

impl LimitKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LimitKind::ContainerDepth => "container depth",
            LimitKind::ObjectCount => "object count",
            LimitKind::StringLength => "string byte length",
            LimitKind::ArrayLength => "array byte length",
            LimitKind::ResourceIdLength => "resource identifier byte length",
            LimitKind::ReferenceCount => "reference count",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource limits enforced while validating a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Deepest allowed nesting of lists, maps, markup, metadata and comments
    pub max_container_depth: u64,
    /// Most objects a document may contain
    pub max_object_count: u64,
    pub max_string_byte_length: u64,
    /// Applies to binary and typed arrays
    pub max_array_byte_length: u64,
    pub max_resource_id_byte_length: u64,
    /// Most markers and references a document may contain
    pub max_reference_count: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_container_depth: 1000,
            max_object_count: 1_000_000,
            max_string_byte_length: 100_000_000,
            max_array_byte_length: 1_000_000_000,
            max_resource_id_byte_length: 10_000,
            max_reference_count: 100_000,
        }
    }
}

impl Limits {
    /// Creates the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Small limits suited to untrusted input.
    ///
    /// ```rust
    /// use concise_rules::Limits;
    ///
    /// let strict = Limits::strict();
    /// assert!(strict.max_container_depth < Limits::default().max_container_depth);
    /// assert!(strict.validate().is_ok());
    /// ```
    #[must_use]
    pub fn strict() -> Self {
        Limits {
            max_container_depth: 64,
            max_object_count: 100_000,
            max_string_byte_length: 1024 * 1024,
            max_array_byte_length: 16 * 1024 * 1024,
            max_resource_id_byte_length: 2048,
            max_reference_count: 1024,
        }
    }

    #[must_use]
    pub fn with_max_container_depth(mut self, value: u64) -> Self {
        self.max_container_depth = value;
        self
    }

    #[must_use]
    pub fn with_max_object_count(mut self, value: u64) -> Self {
        self.max_object_count = value;
        self
    }

    #[must_use]
    pub fn with_max_string_byte_length(mut self, value: u64) -> Self {
        self.max_string_byte_length = value;
        self
    }

    #[must_use]
    pub fn with_max_array_byte_length(mut self, value: u64) -> Self {
        self.max_array_byte_length = value;
        self
    }

    #[must_use]
    pub fn with_max_resource_id_byte_length(mut self, value: u64) -> Self {
        self.max_resource_id_byte_length = value;
        self
    }

    #[must_use]
    pub fn with_max_reference_count(mut self, value: u64) -> Self {
        self.max_reference_count = value;
        self
    }

    /// Returns the configured value of `limit`.
    #[must_use]
    pub const fn get(&self, limit: LimitKind) -> u64 {
        match limit {
            LimitKind::ContainerDepth => self.max_container_depth,
            LimitKind::ObjectCount => self.max_object_count,
            LimitKind::StringLength => self.max_string_byte_length,
            LimitKind::ArrayLength => self.max_array_byte_length,
            LimitKind::ResourceIdLength => self.max_resource_id_byte_length,
            LimitKind::ReferenceCount => self.max_reference_count,
        }
    }

    /// Checks that every limit is at least 1.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first zero limit.
    pub fn validate(&self) -> Result<()> {
        const ALL: [LimitKind; 6] = [
            LimitKind::ContainerDepth,
            LimitKind::ObjectCount,
            LimitKind::StringLength,
            LimitKind::ArrayLength,
            LimitKind::ResourceIdLength,
            LimitKind::ReferenceCount,
        ];
        match ALL.into_iter().find(|limit| self.get(*limit) == 0) {
            Some(limit) => Err(Error::InvalidLimits(format!("max {limit} must be at least 1"))),
            None => Ok(()),
        }
    }
}
