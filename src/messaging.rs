// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Messaging capability shared by every event producer.
//!
//! Producers hold a [`Bus`] handle onto the [`Dispatcher`]'s incoming queue
//! and push [`Event`]s through it, fire-and-forget. The queue is unbounded
//! and thread-safe; pushing never blocks.
//!
//! [`Dispatcher`]: crate::Dispatcher

use futures::channel::mpsc;

use crate::message::Event;

/// Clonable producer handle onto the shared event queue.
#[derive(Clone, Debug)]
pub struct Bus {
    sender: mpsc::UnboundedSender<Event>,
}

impl Bus {
    /// Creates a new queue, returning the producer [`Bus`] and the single
    /// consumer end.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }

    /// Pushes the given payload onto the queue.
    ///
    /// Accepts anything convertible into an [`Event`]: a raw string becomes
    /// a plain [`Message`], a [`RunnerMessage`] passes through as a status
    /// event. There is no return value contract; if the consumer end is
    /// gone, the event is dropped.
    ///
    /// [`Message`]: crate::message::Message
    /// [`RunnerMessage`]: crate::message::RunnerMessage
    pub fn message(&self, payload: impl Into<Event>) {
        drop(self.sender.unbounded_send(payload.into()));
    }

    /// Pushes an error [`Event`] for the given test identifier.
    pub fn error(&self, test: impl Into<String>, text: impl Into<String>) {
        self.message(Event::error(test, text));
    }
}

/// Capability of emitting [`Event`]s onto the shared queue.
///
/// Implemented by any component constructed with a [`Bus`] reference
/// (explicit dependency injection rather than inheritance).
pub trait Messaging {
    /// Returns the [`Bus`] this component emits through.
    fn bus(&self) -> &Bus;

    /// Emits the given payload.
    fn message(&self, payload: impl Into<Event>) {
        self.bus().message(payload);
    }

    /// Emits an error [`Event`] for the given test identifier.
    fn error(&self, test: impl Into<String>, text: impl Into<String>) {
        self.bus().error(test, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RunnerMessage, Status};

    #[test]
    fn pushes_are_received_in_order() {
        let (bus, mut rx) = Bus::channel();
        bus.message("first");
        bus.error("T", "second");
        bus.message(RunnerMessage::lifecycle("T", "third", Status::Started, false));

        let mut seen = Vec::new();
        while let Ok(Some(ev)) = rx.try_next() {
            seen.push(ev.to_string());
        }
        assert_eq!(seen, ["first", "ERROR - T second", "T third"]);
    }

    #[test]
    fn push_without_consumer_is_a_no_op() {
        let (bus, rx) = Bus::channel();
        drop(rx);
        bus.message("nobody listens");
    }
}
