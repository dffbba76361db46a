// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Built-in streaming subscriber folding [`Event`]s into the result set
//! consumed by batch reporters at run end.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use linked_hash_map::LinkedHashMap;

use crate::{
    message::{Event, Message, RunnerMessage, Status},
    reporter::StreamingReporter,
};

/// Per-test rollup of a sequence of [`RunnerMessage`]s.
#[derive(Clone, Debug)]
pub struct ReportTestState {
    /// Test name.
    pub test: String,

    /// Latest reported [`Status`] (last write wins).
    pub status: Status,

    /// Running sum of all step durations.
    pub duration: Duration,

    /// Whether this entry belongs to a setup/teardown/check scenario.
    /// Reporters exclude such entries from pass/fail counts.
    pub is_special: bool,

    /// Timestamp of the first message.
    pub timestamp: SystemTime,

    /// Every received [`RunnerMessage`], in arrival order. Never empty.
    pub steps: Vec<RunnerMessage>,
}

impl ReportTestState {
    fn new(message: RunnerMessage) -> Self {
        Self {
            test: message.test.clone(),
            status: message.status,
            duration: message.duration,
            is_special: message.is_special,
            timestamp: message.timestamp,
            steps: vec![message],
        }
    }

    /// Appends a message, recomputing the aggregate: duration sums up,
    /// status follows the latest message.
    pub fn push(&mut self, message: RunnerMessage) {
        self.duration += message.duration;
        self.status = message.status;
        self.steps.push(message);
    }
}

/// Always-present streaming subscriber accumulating `states` and `errors`
/// for the end-of-run report phase.
///
/// Entries are keyed by test name; two specifications sharing a name merge
/// silently into one aggregate (name uniqueness is the parser's invariant,
/// trusted here).
#[derive(Debug, Default)]
pub struct Collector {
    states: LinkedHashMap<String, ReportTestState>,
    errors: Vec<Message>,
}

impl Collector {
    /// Creates an empty [`Collector`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-test rollups, keyed by test name in first-seen order.
    #[must_use]
    pub fn states(&self) -> &LinkedHashMap<String, ReportTestState> {
        &self.states
    }

    /// Every error message received, in arrival order.
    #[must_use]
    pub fn errors(&self) -> &[Message] {
        &self.errors
    }

    /// Splits this [`Collector`] into its accumulated result set.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (LinkedHashMap<String, ReportTestState>, Vec<Message>) {
        (self.states, self.errors)
    }
}

#[async_trait]
impl StreamingReporter for Collector {
    async fn update(&mut self, ev: Event) {
        match ev {
            Event::Runner(message) => match self.states.get_mut(&message.test)
            {
                Some(state) => state.push(message),
                None => {
                    let state = ReportTestState::new(message);
                    drop(self.states.insert(state.test.clone(), state));
                }
            },
            Event::Error(message) => self.errors.push(message),
            Event::Plain(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(test: &str, status: Status, millis: u64) -> RunnerMessage {
        RunnerMessage {
            test: test.into(),
            text: String::new(),
            timestamp: SystemTime::now(),
            status,
            duration: Duration::from_millis(millis),
            out: String::new(),
            err: String::new(),
            is_special: false,
            number: 0,
        }
    }

    #[tokio::test]
    async fn aggregates_duration_status_and_steps() {
        let mut collector = Collector::new();
        collector.update(message("T", Status::Started, 0).into()).await;
        collector.update(message("T", Status::Success, 40).into()).await;
        collector.update(message("T", Status::Warning, 60).into()).await;

        let state = &collector.states()["T"];
        assert_eq!(state.duration, Duration::from_millis(100));
        assert_eq!(state.status, Status::Warning);
        assert_eq!(state.steps.len(), 3);
    }

    #[tokio::test]
    async fn errors_are_collected_and_plain_messages_ignored() {
        let mut collector = Collector::new();
        collector.update("just a note".into()).await;
        collector.update(Event::error("T", "broken")).await;

        assert!(collector.states().is_empty());
        assert_eq!(collector.errors().len(), 1);
        assert_eq!(collector.errors()[0].text, "broken");
    }

    #[tokio::test]
    async fn same_test_name_merges_silently() {
        let mut collector = Collector::new();
        collector.update(message("T", Status::Success, 10).into()).await;
        collector.update(message("T", Status::Success, 10).into()).await;
        assert_eq!(collector.states().len(), 1);
        assert_eq!(collector.states()["T"].steps.len(), 2);
    }
}
