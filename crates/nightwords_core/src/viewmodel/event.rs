//! One-shot event queue for navigation and snackbar signals.
//!
//! # Invariants
//! - An emitted event is delivered to at most one `take`.
//! - Events are never part of saved state, so a restore cannot replay them.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQueue<E> {
    pending: VecDeque<E>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn emit(&mut self, event: E) {
        self.pending.push_back(event);
    }

    /// Oldest undelivered event, left in place.
    pub fn peek(&self) -> Option<&E> {
        self.pending.front()
    }

    /// Consumes the oldest undelivered event.
    pub fn take(&mut self) -> Option<E> {
        self.pending.pop_front()
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::EventQueue;

    #[test]
    fn take_consumes_in_emit_order() {
        let mut events = EventQueue::new();
        events.emit("first");
        events.emit("second");

        assert_eq!(events.peek(), Some(&"first"));
        assert_eq!(events.take(), Some("first"));
        assert_eq!(events.take(), Some("second"));
        assert_eq!(events.take(), None);
        assert!(!events.is_pending());
    }
}
