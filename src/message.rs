// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Key occurrences in a lifecycle of a test run.
//!
//! The top-level enum here is [`Event`]. Every producer wraps its payload
//! into one of its variants and pushes it onto the shared queue, from where
//! the [`Dispatcher`] fans it out to all subscribed reporters.
//!
//! [`Dispatcher`]: crate::Dispatcher

use std::{
    fmt,
    time::{Duration, SystemTime},
};

/// Execution status of a [`Step`], a [`Scenario`] or a whole test.
///
/// The derived ordering doubles as the severity order used for status
/// escalation: `Skipped < Success < Warning < Error`. The lifecycle variants
/// sort below [`Skipped`] and never participate in escalation.
///
/// [`Scenario`]: crate::Scenario
/// [`Skipped`]: Status::Skipped
/// [`Step`]: crate::Step
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Status {
    /// Execution hasn't been attempted yet.
    #[default]
    NotExecuted,

    /// Execution is about to begin.
    Started,

    /// Execution is in progress.
    Running,

    /// Execution was skipped entirely.
    Skipped,

    /// Execution finished successfully.
    Success,

    /// Execution finished, but something deserves attention (e.g. a step
    /// without a command to run).
    Warning,

    /// Execution failed.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::NotExecuted => "not_executed",
            Self::Started => "started",
            Self::Running => "running",
            Self::Skipped => "skipped",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{repr}")
    }
}

/// Plain event record: something happened, optionally tied to a test.
///
/// Immutable once created. `timestamp` defaults to the creation time.
#[derive(Clone, Debug)]
pub struct Message {
    /// Name of the test this message belongs to. May be empty for run-level
    /// messages.
    pub test: String,

    /// Free-form message text.
    pub text: String,

    /// [`SystemTime`] when this message was created.
    pub timestamp: SystemTime,
}

impl Message {
    /// Creates a new [`Message`] stamped with the current time.
    #[must_use]
    pub fn new(test: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            text: text.into(),
            timestamp: SystemTime::now(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.test.is_empty(), self.text.is_empty()) {
            (false, false) => write!(f, "{} {}", self.test, self.text),
            (false, true) => write!(f, "{}", self.test),
            _ => write!(f, "{}", self.text),
        }
    }
}

/// Event emitted by the [`Runner`] once per step state transition and once
/// per scenario-level lifecycle edge (`started`, `setup`, `running`,
/// `teardown`, `finished`).
///
/// [`Runner`]: crate::Runner
#[derive(Clone, Debug)]
pub struct RunnerMessage {
    /// Name of the test this message belongs to.
    pub test: String,

    /// Human-readable description of the transition.
    pub text: String,

    /// [`SystemTime`] when this message was created.
    pub timestamp: SystemTime,

    /// [`Status`] reported by this transition.
    pub status: Status,

    /// Execution time of the step, [`Duration::ZERO`] for lifecycle edges.
    pub duration: Duration,

    /// Captured standard output of the step.
    pub out: String,

    /// Captured error output of the step.
    pub err: String,

    /// Whether this message belongs to a setup/teardown/check scenario
    /// rather than an ordinary test. Reporters exclude such entries from
    /// pass/fail counts.
    pub is_special: bool,

    /// 1-based sequence position of the step within its scenario, `0` for
    /// lifecycle edges.
    pub number: usize,
}

impl RunnerMessage {
    /// Creates a lifecycle-edge [`RunnerMessage`] (no step attached).
    #[must_use]
    pub fn lifecycle(
        test: impl Into<String>,
        text: impl Into<String>,
        status: Status,
        is_special: bool,
    ) -> Self {
        Self {
            test: test.into(),
            text: text.into(),
            timestamp: SystemTime::now(),
            status,
            duration: Duration::ZERO,
            out: String::new(),
            err: String::new(),
            is_special,
            number: 0,
        }
    }
}

impl fmt::Display for RunnerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.test.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{} {}", self.test, self.text)
        }
    }
}

/// Any event flowing through the messaging pipeline.
#[derive(Clone, Debug)]
pub enum Event {
    /// Plain informational [`Message`].
    Plain(Message),

    /// [`Message`] reporting an unrecoverable condition of a step, scenario
    /// or specification.
    Error(Message),

    /// Step or run status transition.
    Runner(RunnerMessage),
}

impl Event {
    /// Creates an error [`Event`] out of a test identifier and a text.
    #[must_use]
    pub fn error(test: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Error(Message::new(test, text))
    }

    /// Name of the test this event belongs to.
    #[must_use]
    pub fn test(&self) -> &str {
        match self {
            Self::Plain(m) | Self::Error(m) => &m.test,
            Self::Runner(m) => &m.test,
        }
    }

    /// [`SystemTime`] when this event was created.
    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        match self {
            Self::Plain(m) | Self::Error(m) => m.timestamp,
            Self::Runner(m) => m.timestamp,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(m) => write!(f, "{m}"),
            Self::Error(m) => {
                // Blank parts are omitted from the rendering.
                write!(f, "ERROR -")?;
                if !m.test.is_empty() {
                    write!(f, " {}", m.test)?;
                }
                if !m.text.is_empty() {
                    write!(f, " {}", m.text)?;
                }
                Ok(())
            }
            Self::Runner(m) => write!(f, "{m}"),
        }
    }
}

impl From<Message> for Event {
    fn from(m: Message) -> Self {
        Self::Plain(m)
    }
}

impl From<RunnerMessage> for Event {
    fn from(m: RunnerMessage) -> Self {
        Self::Runner(m)
    }
}

impl From<&str> for Event {
    fn from(text: &str) -> Self {
        Self::Plain(Message::new("", text))
    }
}

impl From<String> for Event {
    fn from(text: String) -> Self {
        Self::Plain(Message::new("", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_escalates() {
        assert!(Status::Skipped < Status::Success);
        assert!(Status::Success < Status::Warning);
        assert!(Status::Warning < Status::Error);
        assert_eq!(
            Status::Error,
            [Status::Success, Status::Error, Status::Warning]
                .into_iter()
                .max()
                .unwrap(),
        );
    }

    #[test]
    fn error_event_renders_with_prefix() {
        let ev = Event::error("T1", "something broke");
        assert_eq!(ev.to_string(), "ERROR - T1 something broke");

        let no_test = Event::error("", "parse failure");
        assert_eq!(no_test.to_string(), "ERROR - parse failure");

        let no_text = Event::error("T2", "");
        assert_eq!(no_text.to_string(), "ERROR - T2");
    }

    #[test]
    fn string_payload_becomes_plain_message() {
        let ev: Event = "running".into();
        match &ev {
            Event::Plain(m) => {
                assert!(m.test.is_empty());
                assert_eq!(m.text, "running");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(ev.to_string(), "running");
    }

    #[test]
    fn timestamp_defaults_to_creation_time() {
        let before = SystemTime::now();
        let m = Message::new("T", "text");
        let after = SystemTime::now();
        assert!(m.timestamp >= before && m.timestamp <= after);
    }
}
