//! Marked objects and forward references.
//!
//! [`MarkerRegistry`] remembers the class of every object tagged with a
//! marker, and the type constraints of references seen before their target
//! was marked. Both tables are [`IndexMap`]s so that unresolved references are
//! reported in the order they first appeared.
//!
//! ```rust
//! use concise_rules::registry::MarkerRegistry;
//! use concise_rules::{EventClass, Identifier};
//!
//! let mut registry = MarkerRegistry::new();
//! let id = Identifier::Text("a".into());
//!
//! // A reference in a map key position must point to something keyable.
//! registry.add_forward(id.clone(), EventClass::KEYABLE).unwrap();
//! assert!(registry.check_resolved().is_err());
//!
//! registry.mark(id, EventClass::STRING).unwrap();
//! assert!(registry.check_resolved().is_ok());
//! ```

use crate::identifier::Identifier;
use crate::{Error, EventClass, Result};
use indexmap::IndexMap;

/// Identifier tables for one document.
#[derive(Debug, Default, Clone)]
pub struct MarkerRegistry {
    marked: IndexMap<Identifier, EventClass>,
    forward: IndexMap<Identifier, EventClass>,
    pending: Vec<Identifier>,
}

impl MarkerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything; used when the engine is reset.
    pub fn clear(&mut self) {
        self.marked.clear();
        self.forward.clear();
        self.pending.clear();
    }

    /// Remembers the id of a marker whose object has not finished yet.
    pub fn push_pending(&mut self, id: Identifier) {
        self.pending.push(id);
    }

    /// Takes the id of the innermost marker whose object just finished.
    pub fn pop_pending(&mut self) -> Option<Identifier> {
        self.pending.pop()
    }

    /// Records that the object marked `id` has finished with class `class`.
    ///
    /// # Errors
    ///
    /// Fails if `id` was already marked, or if earlier forward references to
    /// `id` require a type `class` does not satisfy.
    pub fn mark(&mut self, id: Identifier, class: EventClass) -> Result<()> {
        if self.marked.contains_key(&id) {
            return Err(Error::DuplicateMarker { id });
        }
        if let Some(required) = self.forward.shift_remove(&id) {
            if !required.intersects(class) {
                return Err(Error::ForwardReferenceMismatch { id });
            }
            tracing::trace!(%id, "forward reference resolved");
        }
        self.marked.insert(id, class);
        Ok(())
    }

    /// Returns the class of the object marked `id`, if it has been marked.
    #[must_use]
    pub fn lookup(&self, id: &Identifier) -> Option<EventClass> {
        self.marked.get(id).copied()
    }

    /// Records a reference to a not yet marked `id` in a position that
    /// accepts `allowed`. Repeated references narrow the constraint.
    ///
    /// # Errors
    ///
    /// Fails if the narrowed constraint can no longer be satisfied by any object.
    pub fn add_forward(&mut self, id: Identifier, allowed: EventClass) -> Result<()> {
        let required = self.forward.entry(id.clone()).or_insert(allowed);
        *required &= allowed;
        if !required.intersects(EventClass::ANY_OBJECT) {
            return Err(Error::ForwardReferenceConflict { id });
        }
        Ok(())
    }

    /// Fails with the first unresolved forward reference, if any remain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedReferences`] naming the earliest one.
    pub fn check_resolved(&self) -> Result<()> {
        match self.forward.keys().next() {
            Some(id) => Err(Error::UnresolvedReferences {
                id: id.clone(),
                count: self.forward.len(),
            }),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn marked_len(&self) -> usize {
        self.marked.len()
    }

    #[must_use]
    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: &str) -> Identifier {
        Identifier::Text(id.to_string())
    }

    #[test]
    fn test_duplicate_marker() {
        let mut registry = MarkerRegistry::new();
        registry.mark(text("a"), EventClass::LIST).unwrap();
        assert_eq!(
            registry.mark(text("a"), EventClass::MAP).unwrap_err(),
            Error::DuplicateMarker { id: text("a") }
        );
    }

    #[test]
    fn test_int_and_text_ids_are_distinct() {
        let mut registry = MarkerRegistry::new();
        registry.mark(Identifier::Int(1), EventClass::LIST).unwrap();
        registry.mark(text("1"), EventClass::LIST).unwrap();
        assert_eq!(registry.marked_len(), 2);
    }

    #[test]
    fn test_lookup() {
        let mut registry = MarkerRegistry::new();
        registry.mark(text("a"), EventClass::MAP).unwrap();
        assert_eq!(registry.lookup(&text("a")), Some(EventClass::MAP));
        assert_eq!(registry.lookup(&text("b")), None);
    }

    #[test]
    fn test_forward_reference_type_mismatch() {
        let mut registry = MarkerRegistry::new();
        registry.add_forward(text("k"), EventClass::KEYABLE).unwrap();
        assert_eq!(
            registry.mark(text("k"), EventClass::LIST).unwrap_err(),
            Error::ForwardReferenceMismatch { id: text("k") }
        );
    }

    #[test]
    fn test_forward_constraints_intersect() {
        let mut registry = MarkerRegistry::new();
        registry.add_forward(text("x"), EventClass::ANY_OBJECT).unwrap();
        registry.add_forward(text("x"), EventClass::KEYABLE).unwrap();
        assert_eq!(registry.forward_len(), 1);
        assert!(registry.clone().mark(text("x"), EventClass::MAP).is_err());
        assert!(registry.mark(text("x"), EventClass::STRING).is_ok());
    }

    #[test]
    fn test_forward_conflict() {
        let mut registry = MarkerRegistry::new();
        registry.add_forward(text("x"), EventClass::KEYABLE).unwrap();
        let err = registry.add_forward(text("x"), EventClass::LIST).unwrap_err();
        assert_eq!(err, Error::ForwardReferenceConflict { id: text("x") });
    }

    #[test]
    fn test_unresolved_reports_first_seen() {
        let mut registry = MarkerRegistry::new();
        registry.add_forward(text("first"), EventClass::ANY_OBJECT).unwrap();
        registry.add_forward(text("second"), EventClass::ANY_OBJECT).unwrap();
        assert_eq!(
            registry.check_resolved().unwrap_err(),
            Error::UnresolvedReferences {
                id: text("first"),
                count: 2
            }
        );
    }

    #[test]
    fn test_pending_ids_nest() {
        let mut registry = MarkerRegistry::new();
        registry.push_pending(text("outer"));
        registry.push_pending(text("inner"));
        assert_eq!(registry.pop_pending(), Some(text("inner")));
        assert_eq!(registry.pop_pending(), Some(text("outer")));
        assert_eq!(registry.pop_pending(), None);
    }

    #[test]
    fn test_clear() {
        let mut registry = MarkerRegistry::new();
        registry.mark(text("a"), EventClass::LIST).unwrap();
        registry.add_forward(text("b"), EventClass::LIST).unwrap();
        registry.clear();
        assert_eq!(registry.marked_len(), 0);
        assert!(registry.check_resolved().is_ok());
    }
}
