//! Slots, the state stack and the transition table.
//!
//! Each [`Slot`] describes one syntactic position: what it is
//! ([`SlotKind`]), which event classes are legal while it is on top of the
//! stack, and two behavioural flags. The tables in this module are constant;
//! only the [`StateStack`] owned by an engine changes.

use crate::limits::LimitKind;
use crate::{Error, EventClass, Result};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Behavioural flags of a slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SlotFlags: u8 {
        /// The slot belongs to a list, map, markup, metadata or comment.
        const REAL_CONTAINER = 1 << 0;
        /// The next scalar or string completed here is an identifier.
        const AWAITING_ID = 1 << 1;
    }
}

/// The syntactic position a slot represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Permanent bottom of the stack; accepts nothing.
    Nothing,
    BeginDocument,
    Version,
    TopLevel,
    EndDocument,
    ListItem,
    MapKey,
    MapValue,
    MetadataKey,
    MetadataValue,
    /// Metadata has ended and the object it describes comes next.
    MetadataObject,
    CommentItem,
    MarkupName,
    MarkupAttrKey,
    MarkupAttrValue,
    MarkupContents,
    MarkerId,
    MarkerObject,
    ReferenceId,
    ArrayChunk,
    ArrayData,
}

const OBJECT_POSITION: EventClass = EventClass::ANY_OBJECT
    .union(EventClass::INVISIBLE)
    .union(EventClass::PREFIX)
    .union(EventClass::REFERENCE);

const KEY_POSITION: EventClass = EventClass::KEYABLE
    .union(EventClass::INVISIBLE)
    .union(EventClass::PREFIX)
    .union(EventClass::REFERENCE)
    .union(EventClass::END_CONTAINER);

/// Classes a marked object may belong to, before narrowing by its position.
pub const MARKABLE: EventClass = EventClass::ANY_OBJECT
    .union(EventClass::INVISIBLE)
    .union(EventClass::METADATA);

impl SlotKind {
    /// The allowed events of a freshly pushed slot of this kind.
    ///
    /// [`MetadataObject`](Self::MetadataObject) and
    /// [`MarkerObject`](Self::MarkerObject) are narrowed further by their
    /// enclosing position when pushed.
    #[must_use]
    pub const fn allowed(self) -> EventClass {
        match self {
            SlotKind::Nothing => EventClass::empty(),
            SlotKind::BeginDocument => EventClass::BEGIN_DOCUMENT,
            SlotKind::Version => EventClass::VERSION,
            SlotKind::TopLevel
            | SlotKind::MapValue
            | SlotKind::MetadataValue
            | SlotKind::MarkupAttrValue
            | SlotKind::MetadataObject => OBJECT_POSITION,
            SlotKind::EndDocument => EventClass::END_DOCUMENT.union(EventClass::INVISIBLE),
            SlotKind::ListItem => OBJECT_POSITION.union(EventClass::END_CONTAINER),
            SlotKind::MapKey | SlotKind::MetadataKey | SlotKind::MarkupAttrKey => KEY_POSITION,
            SlotKind::CommentItem => EventClass::STRING
                .union(EventClass::INVISIBLE)
                .union(EventClass::END_CONTAINER),
            SlotKind::MarkupName | SlotKind::MarkerId => EventClass::IDENTIFIER,
            SlotKind::MarkupContents => EventClass::STRING
                .union(EventClass::MARKUP)
                .union(EventClass::INVISIBLE)
                .union(EventClass::END_CONTAINER),
            SlotKind::MarkerObject => MARKABLE,
            SlotKind::ReferenceId => EventClass::IDENTIFIER.union(EventClass::RESOURCE_ID),
            SlotKind::ArrayChunk => EventClass::ARRAY_CHUNK.union(EventClass::PADDING),
            SlotKind::ArrayData => EventClass::ARRAY_DATA,
        }
    }

    #[must_use]
    pub const fn flags(self) -> SlotFlags {
        match self {
            SlotKind::ListItem
            | SlotKind::MapKey
            | SlotKind::MapValue
            | SlotKind::MetadataKey
            | SlotKind::MetadataValue
            | SlotKind::CommentItem
            | SlotKind::MarkupAttrKey
            | SlotKind::MarkupAttrValue
            | SlotKind::MarkupContents => SlotFlags::REAL_CONTAINER,
            SlotKind::MarkupName => SlotFlags::REAL_CONTAINER.union(SlotFlags::AWAITING_ID),
            SlotKind::MarkerId | SlotKind::ReferenceId => SlotFlags::AWAITING_ID,
            _ => SlotFlags::empty(),
        }
    }

    /// Returns `true` for the wrappers that stand in front of an object
    /// without being one: marker, reference and metadata.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        matches!(
            self,
            SlotKind::MarkerId
                | SlotKind::MarkerObject
                | SlotKind::ReferenceId
                | SlotKind::MetadataObject
        )
    }

    /// The kind this slot becomes once a child finishes normally.
    ///
    /// Wrappers and array slots have no entry; they are resolved or popped
    /// by the engine instead.
    #[must_use]
    pub const fn next(self) -> Option<SlotKind> {
        match self {
            SlotKind::TopLevel => Some(SlotKind::EndDocument),
            SlotKind::ListItem => Some(SlotKind::ListItem),
            SlotKind::MapKey => Some(SlotKind::MapValue),
            SlotKind::MapValue => Some(SlotKind::MapKey),
            SlotKind::MetadataKey => Some(SlotKind::MetadataValue),
            SlotKind::MetadataValue => Some(SlotKind::MetadataKey),
            SlotKind::MarkupName => Some(SlotKind::MarkupAttrKey),
            SlotKind::MarkupAttrKey => Some(SlotKind::MarkupAttrValue),
            SlotKind::MarkupAttrValue => Some(SlotKind::MarkupAttrKey),
            SlotKind::MarkupContents => Some(SlotKind::MarkupContents),
            SlotKind::CommentItem => Some(SlotKind::CommentItem),
            SlotKind::MarkerId => Some(SlotKind::MarkerObject),
            _ => None,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            SlotKind::Nothing => "no document is open",
            SlotKind::BeginDocument => "awaiting begin document",
            SlotKind::Version => "awaiting the version",
            SlotKind::TopLevel => "awaiting the top-level object",
            SlotKind::EndDocument => "awaiting end document",
            SlotKind::ListItem => "awaiting a list item",
            SlotKind::MapKey => "awaiting a map key",
            SlotKind::MapValue => "awaiting a map value",
            SlotKind::MetadataKey => "awaiting a metadata key",
            SlotKind::MetadataValue => "awaiting a metadata value",
            SlotKind::MetadataObject => "awaiting the object metadata applies to",
            SlotKind::CommentItem => "inside a comment",
            SlotKind::MarkupName => "awaiting a markup name",
            SlotKind::MarkupAttrKey => "awaiting a markup attribute key",
            SlotKind::MarkupAttrValue => "awaiting a markup attribute value",
            SlotKind::MarkupContents => "inside markup contents",
            SlotKind::MarkerId => "awaiting a marker id",
            SlotKind::MarkerObject => "awaiting a marked object",
            SlotKind::ReferenceId => "awaiting a reference id",
            SlotKind::ArrayChunk => "awaiting an array chunk",
            SlotKind::ArrayData => "awaiting array data",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One entry on the state stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub kind: SlotKind,
    pub allowed: EventClass,
    pub flags: SlotFlags,
}

impl Slot {
    /// A slot of `kind` with its default allowed events.
    #[must_use]
    pub const fn of(kind: SlotKind) -> Self {
        Slot {
            kind,
            allowed: kind.allowed(),
            flags: kind.flags(),
        }
    }

    /// A slot of `kind` that only allows what `enclosing` allows as well.
    #[must_use]
    pub const fn narrowed(kind: SlotKind, enclosing: EventClass) -> Self {
        Slot {
            kind,
            allowed: kind.allowed().intersection(enclosing),
            flags: kind.flags(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn allows(&self, class: EventClass) -> bool {
        self.allowed.intersects(class)
    }

    #[inline]
    #[must_use]
    pub const fn is_real_container(&self) -> bool {
        self.flags.contains(SlotFlags::REAL_CONTAINER)
    }

    #[inline]
    #[must_use]
    pub const fn is_awaiting_id(&self) -> bool {
        self.flags.contains(SlotFlags::AWAITING_ID)
    }
}

static NOTHING: Slot = Slot::of(SlotKind::Nothing);

/// The engine's stack of slots.
///
/// The bottom entry is a permanent [`SlotKind::Nothing`]; the stack is never
/// empty. Container pushes are counted separately so that wrappers and
/// arrays do not use up the depth limit.
#[derive(Debug, Clone)]
pub struct StateStack {
    slots: Vec<Slot>,
    depth: u64,
    max_depth: u64,
}

#[allow(clippy::len_without_is_empty)]
impl StateStack {
    /// Creates a stack ready for a new document.
    #[must_use]
    pub fn new(max_depth: u64) -> Self {
        let mut stack = StateStack {
            slots: Vec::with_capacity(16),
            depth: 0,
            max_depth,
        };
        stack.reset();
        stack
    }

    /// Returns to the state before `BeginDocument`.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.slots.push(NOTHING);
        self.slots.push(Slot::of(SlotKind::BeginDocument));
        self.depth = 0;
    }

    /// Drops everything above the permanent bottom entry.
    pub fn close(&mut self) {
        self.slots.truncate(1);
        self.depth = 0;
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> &Slot {
        self.slots.last().unwrap_or(&NOTHING)
    }

    /// The slot `n` entries below the top (`0` is the top itself).
    #[must_use]
    pub fn below_top(&self, n: usize) -> &Slot {
        self.slots
            .len()
            .checked_sub(n + 1)
            .and_then(|i| self.slots.get(i))
            .unwrap_or(&NOTHING)
    }

    /// The nearest slot below the top that is not a transparent wrapper.
    #[must_use]
    pub fn first_real_below_top(&self) -> &Slot {
        self.slots
            .iter()
            .rev()
            .skip(1)
            .find(|slot| !slot.kind.is_transparent())
            .unwrap_or(&NOTHING)
    }

    /// Current container nesting depth.
    #[must_use]
    pub fn depth(&self) -> u64 {
        self.depth
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` once only the permanent bottom slot remains.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.slots.len() <= 1
    }

    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Pushes the first slot of a container.
    ///
    /// # Errors
    ///
    /// Fails if the container would nest deeper than the depth limit.
    pub fn push_container(&mut self, slot: Slot) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::limit(LimitKind::ContainerDepth, self.max_depth));
        }
        self.depth += 1;
        self.slots.push(slot);
        Ok(())
    }

    /// Removes the top slot. The permanent bottom entry is never removed.
    pub fn pop(&mut self) -> Slot {
        if self.slots.len() > 1 {
            self.slots.pop().unwrap_or(NOTHING)
        } else {
            NOTHING
        }
    }

    /// Removes the top slot of a container.
    pub fn pop_container(&mut self) -> Slot {
        self.depth = self.depth.saturating_sub(1);
        self.pop()
    }

    /// Replaces the top slot in place.
    pub fn replace_top(&mut self, slot: Slot) {
        if self.slots.len() > 1 {
            if let Some(top) = self.slots.last_mut() {
                *top = slot;
            }
        }
    }

    /// Moves the top slot to `kind`, keeping it at the same depth.
    pub fn change_top(&mut self, kind: SlotKind) {
        self.replace_top(Slot::of(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stack_awaits_begin_document() {
        let stack = StateStack::new(4);
        assert_eq!(stack.top().kind, SlotKind::BeginDocument);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.depth(), 0);
        assert!(!stack.is_closed());
    }

    #[test]
    fn test_bottom_is_never_removed() {
        let mut stack = StateStack::new(4);
        stack.pop();
        assert_eq!(stack.pop().kind, SlotKind::Nothing);
        assert_eq!(stack.len(), 1);
        assert!(stack.is_closed());
        stack.change_top(SlotKind::TopLevel);
        assert_eq!(stack.top().kind, SlotKind::Nothing);
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = StateStack::new(2);
        stack.push_container(Slot::of(SlotKind::ListItem)).unwrap();
        stack.push_container(Slot::of(SlotKind::MapKey)).unwrap();
        let err = stack
            .push_container(Slot::of(SlotKind::ListItem))
            .unwrap_err();
        assert_eq!(err, Error::limit(LimitKind::ContainerDepth, 2));

        stack.pop_container();
        assert_eq!(stack.depth(), 1);
        assert!(stack.push_container(Slot::of(SlotKind::ListItem)).is_ok());
    }

    #[test]
    fn test_wrappers_do_not_count_toward_depth() {
        let mut stack = StateStack::new(1);
        stack.push(Slot::of(SlotKind::MarkerId));
        stack.push(Slot::of(SlotKind::ArrayChunk));
        assert_eq!(stack.depth(), 0);
        assert!(stack.push_container(Slot::of(SlotKind::ListItem)).is_ok());
    }

    #[test]
    fn test_first_real_below_top_skips_wrappers() {
        let mut stack = StateStack::new(8);
        stack.change_top(SlotKind::TopLevel);
        stack.push_container(Slot::of(SlotKind::MapKey)).unwrap();
        stack.push(Slot::of(SlotKind::MetadataObject));
        stack.push(Slot::of(SlotKind::ReferenceId));
        assert_eq!(stack.first_real_below_top().kind, SlotKind::MapKey);
        assert_eq!(stack.below_top(1).kind, SlotKind::MetadataObject);
    }

    #[test]
    fn test_transition_table() {
        assert_eq!(SlotKind::TopLevel.next(), Some(SlotKind::EndDocument));
        assert_eq!(SlotKind::MapKey.next(), Some(SlotKind::MapValue));
        assert_eq!(SlotKind::MapValue.next(), Some(SlotKind::MapKey));
        assert_eq!(SlotKind::MarkupName.next(), Some(SlotKind::MarkupAttrKey));
        assert_eq!(
            SlotKind::MarkupAttrValue.next(),
            Some(SlotKind::MarkupAttrKey)
        );
        assert_eq!(SlotKind::MarkerId.next(), Some(SlotKind::MarkerObject));
        assert_eq!(SlotKind::ReferenceId.next(), None);
        assert_eq!(SlotKind::ArrayData.next(), None);
    }

    #[test]
    fn test_flags() {
        assert!(Slot::of(SlotKind::ListItem).is_real_container());
        assert!(!Slot::of(SlotKind::MarkerObject).is_real_container());
        assert!(Slot::of(SlotKind::MarkerId).is_awaiting_id());
        assert!(Slot::of(SlotKind::MarkupName).is_awaiting_id());
        assert!(!Slot::of(SlotKind::MapKey).is_awaiting_id());
    }

    #[test]
    fn test_narrowed_marker_object_in_key_position() {
        let slot = Slot::narrowed(SlotKind::MarkerObject, SlotKind::MapKey.allowed());
        assert!(slot.allows(EventClass::STRING));
        assert!(!slot.allows(EventClass::LIST));
        assert!(!slot.allows(EventClass::MARKER));
        assert!(!slot.allows(EventClass::END_CONTAINER));
    }

    #[test]
    fn test_map_key_rejects_non_keyable() {
        let key = Slot::of(SlotKind::MapKey);
        for class in [
            EventClass::NULL,
            EventClass::FLOAT,
            EventClass::LIST,
            EventClass::ARRAY,
        ] {
            assert!(!key.allows(class), "{class:?}");
        }
        assert!(key.allows(EventClass::END_CONTAINER));
        assert!(!Slot::of(SlotKind::MapValue).allows(EventClass::END_CONTAINER));
    }
}
