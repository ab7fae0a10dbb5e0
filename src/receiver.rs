//! Downstream consumers of validated events.
//!
//! A [`RuleEngine`](crate::RuleEngine) forwards every event it accepts to an
//! [`EventReceiver`]. Receivers can be chained: the engine is itself a
//! receiver, and `&mut R` and `Box<R>` forward to the inner receiver.
//!
//! ```rust
//! use concise_rules::{Event, EventReceiver, Limits, RuleEngine};
//!
//! let mut recorded: Vec<Event> = Vec::new();
//! {
//!     let mut engine = RuleEngine::with_receiver(Limits::default(), &mut recorded).unwrap();
//!     engine.on_event(&Event::BeginDocument).unwrap();
//!     engine.on_event(&Event::Version(1)).unwrap();
//!     engine.on_event(&Event::Bool(false)).unwrap();
//!     engine.on_event(&Event::EndDocument).unwrap();
//! }
//! assert_eq!(recorded.len(), 4);
//! ```

use crate::{Event, Result};

/// Consumes a stream of document events.
pub trait EventReceiver {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// A receiver may reject an event; the error is returned to the producer.
    fn on_event(&mut self, event: &Event) -> Result<()>;
}

/// A receiver that ignores everything.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Discard;

impl EventReceiver for Discard {
    #[inline]
    fn on_event(&mut self, _event: &Event) -> Result<()> {
        Ok(())
    }
}

/// Records every event in order.
impl EventReceiver for Vec<Event> {
    fn on_event(&mut self, event: &Event) -> Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

impl<R: EventReceiver + ?Sized> EventReceiver for &mut R {
    #[inline]
    fn on_event(&mut self, event: &Event) -> Result<()> {
        (**self).on_event(event)
    }
}

impl<R: EventReceiver + ?Sized> EventReceiver for Box<R> {
    #[inline]
    fn on_event(&mut self, event: &Event) -> Result<()> {
        (**self).on_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct RejectNull;

    impl EventReceiver for RejectNull {
        fn on_event(&mut self, event: &Event) -> Result<()> {
            match event {
                Event::Null => Err(Error::invalid_identifier("null rejected downstream")),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn test_vec_records_in_order() {
        let mut events = Vec::new();
        events.on_event(&Event::BeginDocument).unwrap();
        events.on_event(&Event::Version(1)).unwrap();
        assert_eq!(events, vec![Event::BeginDocument, Event::Version(1)]);
    }

    #[test]
    fn test_boxed_receiver() {
        let mut receiver: Box<dyn EventReceiver> = Box::new(RejectNull);
        assert!(receiver.on_event(&Event::Bool(true)).is_ok());
        assert!(receiver.on_event(&Event::Null).is_err());
    }

    #[test]
    fn test_discard() {
        assert!(Discard.on_event(&Event::Null).is_ok());
    }
}
