// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Mandatory end-of-run summary reporter.

use std::time::Duration;

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

use crate::{
    collector::ReportTestState,
    message::{Message, Status},
    reporter::{out::Styles, BlockReporter, Result},
    spec::Specification,
};

/// Execution statistics over the non-special [`ReportTestState`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    /// Number of passed tests.
    pub passed: usize,

    /// Number of tests finishing with a warning.
    pub warned: usize,

    /// Number of failed tests.
    pub failed: usize,

    /// Number of skipped tests.
    pub skipped: usize,
}

impl Stats {
    /// Total number of tests these [`Stats`] were collected for.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.warned + self.failed + self.skipped
    }
}

/// Batch reporter printing the run totals, the failure list and every
/// collected error.
///
/// The [`Dispatcher`] appends it unconditionally after all configured batch
/// reporters; it cannot be suppressed.
///
/// [`Dispatcher`]: crate::Dispatcher
#[derive(Debug, Default)]
pub struct Summary {
    styles: Styles,
}

impl Summary {
    /// Creates a new [`Summary`] reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(
        states: &LinkedHashMap<String, ReportTestState>,
    ) -> (Stats, Vec<&str>, Duration) {
        let mut stats = Stats::default();
        let mut failures = Vec::new();
        let mut duration = Duration::ZERO;
        for state in states.values().filter(|s| !s.is_special) {
            duration += state.duration;
            match state.status {
                Status::Success => stats.passed += 1,
                Status::Warning => stats.warned += 1,
                Status::Skipped => stats.skipped += 1,
                _ => {
                    stats.failed += 1;
                    failures.push(state.test.as_str());
                }
            }
        }
        (stats, failures, duration)
    }
}

impl BlockReporter for Summary {
    fn report(
        &mut self,
        specs: &[Specification],
        states: &LinkedHashMap<String, ReportTestState>,
        errors: &[Message],
    ) -> Result<()> {
        let (stats, failures, duration) = Self::collect(states);

        println!(
            "{}",
            self.styles.bold(format!(
                "{} tests run in {} ({} parsed)",
                stats.total(),
                humantime::format_duration(duration),
                specs.len(),
            )),
        );
        println!(
            "{} passed, {} failed, {} with warnings, {} skipped",
            self.styles.ok(stats.passed.to_string()),
            self.styles.err(stats.failed.to_string()),
            self.styles.warn(stats.warned.to_string()),
            self.styles.skipped(stats.skipped.to_string()),
        );
        if !failures.is_empty() {
            println!(
                "{}",
                self.styles
                    .err(format!("failed: {}", failures.iter().join(", "))),
            );
        }
        for error in errors {
            println!("{}", self.styles.err(format!("ERROR - {error}")));
        }
        Ok(())
    }
}
