//! The document rule engine.
//!
//! [`RuleEngine`] consumes one [`Event`] at a time and guarantees that the
//! sequence describes a well-formed document. Every event passes a single
//! legality gate (its class must intersect the allowed events of the slot on
//! top of the stack) before any state changes. Valid events are forwarded to
//! the engine's [`EventReceiver`].
//!
//! ## Usage
//!
//! ```rust
//! use concise_rules::{Event, Limits, RuleEngine};
//!
//! let mut engine = RuleEngine::new(Limits::default()).unwrap();
//! for event in [
//!     Event::BeginDocument,
//!     Event::Version(1),
//!     Event::BeginList,
//!     Event::PositiveInt(5000),
//!     Event::EndContainer,
//!     Event::EndDocument,
//! ] {
//!     engine.on_event(&event).unwrap();
//! }
//! assert!(engine.is_complete());
//! ```
//!
//! ## Forwarding
//!
//! ```rust
//! use concise_rules::{Event, Limits, RuleEngine};
//!
//! let mut engine = RuleEngine::with_receiver(Limits::default(), Vec::new()).unwrap();
//! engine.on_event(&Event::BeginDocument).unwrap();
//! engine.on_event(&Event::Version(1)).unwrap();
//! assert_eq!(engine.receiver().len(), 2);
//! ```
//!
//! ## References
//!
//! A reference may appear before or after the object it names. A reference
//! to an id that is already marked is checked against the marked object's
//! class immediately. A forward reference completes its position at once
//! with the classes that position allows; those classes are recorded and
//! checked when the object is eventually marked, and any reference still
//! unresolved fails the document at `EndDocument`.

use crate::array::{ArrayAccumulator, Progress};
use crate::identifier::Identifier;
use crate::limits::{LimitKind, Limits};
use crate::receiver::{Discard, EventReceiver};
use crate::registry::MarkerRegistry;
use crate::state::{Slot, SlotKind, StateStack};
use crate::utf8::CharPolicy;
use crate::{ArrayKind, Error, Event, EventClass, Result};
use num_bigint::BigInt;

/// The document format version this engine accepts.
pub const SUPPORTED_VERSION: u64 = 1;

/// Validates a document event stream.
///
/// One engine processes one document at a time. After `EndDocument`, or
/// after any error, call [`reset`](Self::reset) before the next document.
#[derive(Debug)]
pub struct RuleEngine<R = Discard> {
    limits: Limits,
    stack: StateStack,
    array: ArrayAccumulator,
    registry: MarkerRegistry,
    object_count: u64,
    reference_count: u64,
    completed: bool,
    receiver: R,
}

impl RuleEngine<Discard> {
    /// Creates an engine that validates without forwarding.
    ///
    /// # Errors
    ///
    /// Fails if any limit is zero.
    pub fn new(limits: Limits) -> Result<Self> {
        Self::with_receiver(limits, Discard)
    }
}

impl<R: EventReceiver> RuleEngine<R> {
    /// Creates an engine that forwards every valid event to `receiver`.
    ///
    /// # Errors
    ///
    /// Fails if any limit is zero.
    pub fn with_receiver(limits: Limits, receiver: R) -> Result<Self> {
        limits.validate()?;
        Ok(RuleEngine {
            limits,
            stack: StateStack::new(limits.max_container_depth),
            array: ArrayAccumulator::new(),
            registry: MarkerRegistry::new(),
            object_count: 0,
            reference_count: 0,
            completed: false,
            receiver,
        })
    }

    /// Discards the current document and prepares for a new one.
    pub fn reset(&mut self) {
        self.stack.reset();
        self.registry.clear();
        self.object_count = 0;
        self.reference_count = 0;
        self.completed = false;
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The position the engine is currently at.
    #[must_use]
    pub fn slot(&self) -> SlotKind {
        self.stack.top().kind
    }

    /// Current container nesting depth.
    #[must_use]
    pub fn depth(&self) -> u64 {
        self.stack.depth()
    }

    /// Objects counted so far in the current document.
    #[must_use]
    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    /// Returns `true` if the engine is waiting for `BeginDocument`.
    #[must_use]
    pub fn is_awaiting_document(&self) -> bool {
        self.slot() == SlotKind::BeginDocument
    }

    /// Returns `true` once `EndDocument` has been accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut R {
        &mut self.receiver
    }

    pub fn into_receiver(self) -> R {
        self.receiver
    }

    /// Validates `event` and forwards it downstream.
    ///
    /// # Errors
    ///
    /// Returns the first rule the event violates, or the receiver's error.
    /// Either way the document is dead: every later event fails until
    /// [`reset`](Self::reset).
    pub fn on_event(&mut self, event: &Event) -> Result<()> {
        let slot = self.stack.top().kind;
        let result = match self.validate(event) {
            Ok(()) => {
                tracing::trace!(event = %event.kind(), %slot, "event accepted");
                self.receiver.on_event(event)
            }
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            tracing::debug!(event = %event.kind(), %slot, error = %err, "event rejected");
            self.stack.close();
            self.completed = false;
        }
        result
    }

    fn validate(&mut self, event: &Event) -> Result<()> {
        self.assert_legal(event)?;
        match event {
            Event::BeginDocument => self.begin_document(),
            Event::Version(version) => self.version(*version),
            Event::Padding => Ok(()),
            Event::Null
            | Event::Bool(_)
            | Event::PositiveInt(_)
            | Event::NegativeInt(_)
            | Event::BigInt(_)
            | Event::Float(_)
            | Event::BigFloat { .. }
            | Event::DecimalFloat { .. }
            | Event::BigDecimalFloat { .. }
            | Event::NaN { .. }
            | Event::Uid(_)
            | Event::Time(_)
            | Event::CompactTime(_) => self.scalar(event),
            Event::BeginList => self.begin_object_container(SlotKind::ListItem),
            Event::BeginMap => self.begin_object_container(SlotKind::MapKey),
            Event::BeginMarkup(name) => self.begin_markup(name.as_deref()),
            Event::BeginMetadata => self.stack.push_container(Slot::of(SlotKind::MetadataKey)),
            Event::BeginComment => self.stack.push_container(Slot::of(SlotKind::CommentItem)),
            Event::BeginMarker => self.begin_marker(),
            Event::BeginReference => self.begin_reference(),
            Event::EndContainer => self.end_container(),
            Event::BeginArray(kind) => self.begin_array(*kind),
            Event::ArrayChunk {
                length,
                more_chunks_follow,
            } => self.array_chunk(*length, *more_chunks_follow),
            Event::ArrayData(bytes) => self.array_data(bytes),
            Event::Array {
                kind,
                element_count,
                data,
            } => self.complete_array(*kind, *element_count, data),
            Event::EndDocument => self.end_document(),
        }
    }

    fn assert_legal(&self, event: &Event) -> Result<()> {
        let top = self.stack.top();
        if top.allows(event.class()) {
            Ok(())
        } else {
            Err(Error::unexpected_event(event.kind(), top.kind))
        }
    }

    fn begin_document(&mut self) -> Result<()> {
        tracing::debug!("document started");
        self.completed = false;
        self.stack.change_top(SlotKind::TopLevel);
        self.stack.push(Slot::of(SlotKind::Version));
        Ok(())
    }

    fn version(&mut self, version: u64) -> Result<()> {
        if version != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion {
                expected: SUPPORTED_VERSION,
                found: version,
            });
        }
        self.stack.pop();
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.registry.check_resolved()?;
        self.stack.close();
        self.completed = true;
        tracing::debug!(
            objects = self.object_count,
            markers = self.registry.marked_len(),
            "document complete"
        );
        Ok(())
    }

    fn count_object(&mut self) -> Result<()> {
        if self.object_count >= self.limits.max_object_count {
            return Err(Error::limit(
                LimitKind::ObjectCount,
                self.limits.max_object_count,
            ));
        }
        self.object_count += 1;
        Ok(())
    }

    fn count_reference(&mut self) -> Result<()> {
        if self.reference_count >= self.limits.max_reference_count {
            return Err(Error::limit(
                LimitKind::ReferenceCount,
                self.limits.max_reference_count,
            ));
        }
        self.reference_count += 1;
        Ok(())
    }

    fn scalar(&mut self, event: &Event) -> Result<()> {
        let top = *self.stack.top();
        if top.is_awaiting_id() {
            let id = match event {
                Event::PositiveInt(value) => Identifier::Int(*value),
                Event::BigInt(value) => big_int_identifier(value)?,
                _ => return Err(Error::unexpected_event(event.kind(), top.kind)),
            };
            return self.on_identifier(id);
        }
        self.count_object()?;
        self.on_child_finished(event.class())
    }

    fn begin_object_container(&mut self, kind: SlotKind) -> Result<()> {
        self.count_object()?;
        self.stack.push_container(Slot::of(kind))
    }

    fn begin_markup(&mut self, name: Option<&str>) -> Result<()> {
        self.count_object()?;
        match name {
            Some(name) => {
                Identifier::from_text_bytes(name.as_bytes())?;
                self.stack.push_container(Slot::of(SlotKind::MarkupAttrKey))
            }
            None => self.stack.push_container(Slot::of(SlotKind::MarkupName)),
        }
    }

    fn begin_marker(&mut self) -> Result<()> {
        self.count_reference()?;
        self.stack.push(Slot::of(SlotKind::MarkerId));
        Ok(())
    }

    fn begin_reference(&mut self) -> Result<()> {
        self.count_reference()?;
        self.stack.push(Slot::of(SlotKind::ReferenceId));
        Ok(())
    }

    fn end_container(&mut self) -> Result<()> {
        let top = *self.stack.top();
        match top.kind {
            SlotKind::ListItem => {
                self.stack.pop_container();
                self.on_child_finished(EventClass::LIST)
            }
            SlotKind::MapKey => {
                self.stack.pop_container();
                self.on_child_finished(EventClass::MAP)
            }
            SlotKind::MarkupAttrKey => {
                self.stack.change_top(SlotKind::MarkupContents);
                Ok(())
            }
            SlotKind::MarkupContents => {
                self.stack.pop_container();
                self.on_child_finished(EventClass::MARKUP)
            }
            SlotKind::MetadataKey => {
                self.stack.pop_container();
                let enclosing = self.stack.top().allowed;
                self.stack
                    .push(Slot::narrowed(SlotKind::MetadataObject, enclosing));
                Ok(())
            }
            SlotKind::CommentItem => {
                self.stack.pop_container();
                Ok(())
            }
            other => Err(Error::unexpected_event(
                crate::EventKind::EndContainer,
                other,
            )),
        }
    }

    /// Rolls a finished child of class `class` up the stack.
    ///
    /// Transparent wrappers directly above the enclosing position are
    /// resolved and popped one by one, each finishing with the same class,
    /// until a real position takes its normal transition.
    fn on_child_finished(&mut self, class: EventClass) -> Result<()> {
        loop {
            let top = *self.stack.top();
            match top.kind {
                SlotKind::MarkerObject => {
                    self.stack.pop();
                    if let Some(id) = self.registry.pop_pending() {
                        tracing::trace!(%id, ?class, "object marked");
                        self.registry.mark(id, class)?;
                    }
                }
                SlotKind::MetadataObject => {
                    self.stack.pop();
                }
                kind => {
                    if let Some(next) = kind.next() {
                        self.stack.change_top(next);
                    }
                    return Ok(());
                }
            }
        }
    }

    fn on_identifier(&mut self, id: Identifier) -> Result<()> {
        let top = *self.stack.top();
        match top.kind {
            SlotKind::MarkerId => {
                let enclosing = self.stack.below_top(1).allowed;
                self.registry.push_pending(id);
                self.stack
                    .replace_top(Slot::narrowed(SlotKind::MarkerObject, enclosing));
                Ok(())
            }
            SlotKind::MarkupName => {
                self.stack.change_top(SlotKind::MarkupAttrKey);
                Ok(())
            }
            SlotKind::ReferenceId => self.resolve_reference(id),
            other => Err(Error::invalid_identifier(format!(
                "unexpected identifier {id} while {other}"
            ))),
        }
    }

    fn resolve_reference(&mut self, id: Identifier) -> Result<()> {
        let position = *self.stack.first_real_below_top();
        match self.registry.lookup(&id) {
            Some(class) => {
                if !position.allows(class) {
                    return Err(Error::ReferenceTypeMismatch { id });
                }
                tracing::trace!(%id, "reference resolved");
                self.stack.pop();
                self.on_child_finished(class)
            }
            None => {
                let allowed = position.allowed & EventClass::ANY_OBJECT;
                tracing::trace!(%id, "forward reference recorded");
                self.registry.add_forward(id, allowed)?;
                self.stack.pop();
                self.on_child_finished(allowed)
            }
        }
    }

    fn resolve_remote_reference(&mut self) -> Result<()> {
        tracing::trace!("remote reference");
        self.stack.pop();
        self.on_child_finished(EventClass::ANY_OBJECT)
    }

    fn begin_array(&mut self, kind: ArrayKind) -> Result<()> {
        let top = *self.stack.top();
        let in_comment = top.kind == SlotKind::CommentItem;
        if !top.is_awaiting_id() && !in_comment {
            self.count_object()?;
        }
        let capture = top.is_awaiting_id() && kind == ArrayKind::String;
        let policy = if in_comment {
            CharPolicy::Comment
        } else {
            CharPolicy::Text
        };
        self.array.begin(kind, &self.limits, capture, policy);
        self.stack.push(Slot::of(SlotKind::ArrayChunk));
        Ok(())
    }

    fn array_chunk(&mut self, length: u64, more_chunks_follow: bool) -> Result<()> {
        let progress = self.array.begin_chunk(length, more_chunks_follow)?;
        self.on_array_progress(progress)
    }

    fn array_data(&mut self, bytes: &[u8]) -> Result<()> {
        let progress = self.array.add_data(bytes)?;
        self.on_array_progress(progress)
    }

    /// Runs a whole array through the chunked path. The data must fill the
    /// declared length exactly so the array is closed when this returns.
    fn complete_array(&mut self, kind: ArrayKind, element_count: u64, data: &[u8]) -> Result<()> {
        if kind == ArrayKind::ResourceIdConcat {
            return Err(Error::ConcatAsCompleteArray);
        }
        // An oversized count is left to the chunk header's limit check.
        if let Some(expected) = kind.byte_length(element_count) {
            let received = data.len() as u64;
            if expected != received {
                return Err(Error::ArrayLengthMismatch { expected, received });
            }
        }
        self.begin_array(kind)?;
        self.array_chunk(element_count, false)?;
        if data.is_empty() {
            Ok(())
        } else {
            self.array_data(data)
        }
    }

    fn on_array_progress(&mut self, progress: Progress) -> Result<()> {
        match progress {
            Progress::Data => {
                self.stack.change_top(SlotKind::ArrayData);
                Ok(())
            }
            Progress::Chunk => {
                self.stack.change_top(SlotKind::ArrayChunk);
                Ok(())
            }
            Progress::Complete => {
                self.stack.pop();
                self.on_array_complete()
            }
        }
    }

    fn on_array_complete(&mut self) -> Result<()> {
        let kind = self.array.kind();
        if self.stack.top().is_awaiting_id() {
            if kind.is_resource_id() {
                return self.resolve_remote_reference();
            }
            let id = Identifier::from_text_bytes(&self.array.take_buffer())?;
            return self.on_identifier(id);
        }
        self.on_child_finished(kind.class())
    }
}

impl<R: EventReceiver> EventReceiver for RuleEngine<R> {
    fn on_event(&mut self, event: &Event) -> Result<()> {
        RuleEngine::on_event(self, event)
    }
}

fn big_int_identifier(value: &BigInt) -> Result<Identifier> {
    u64::try_from(value)
        .map(Identifier::Int)
        .map_err(|_| Error::invalid_identifier(format!("{value} does not fit an integer identifier")))
}
