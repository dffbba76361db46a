// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Test-case data model: [`Specification`], [`Scenario`] and [`Step`].
//!
//! A [`Specification`] is one test case's identity plus an optional
//! [`Scenario`]; a [`Scenario`] is an ordered sequence of [`Step`]s; a
//! [`Step`] is one unit of work paired with an externally supplied
//! executable [`Command`].

use std::{
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use crate::message::Status;

/// Free-form key/value bag threaded through command execution and passed to
/// reporters.
///
/// The [`Runner`] exports the last scenario status under the `"status"` key.
///
/// [`Runner`]: crate::Runner
#[derive(Clone, Debug, Default)]
pub struct Context(HashMap<String, String>);

impl Context {
    /// Creates an empty [`Context`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Iterates over all stored key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Result of executing a [`Command`].
#[derive(Clone, Debug, Default)]
pub struct Outcome {
    /// Terminal [`Status`] of the execution.
    pub status: Status,

    /// Captured standard output.
    pub out: String,

    /// Captured error output.
    pub err: String,

    /// Wall-clock execution time.
    pub exec_time: Duration,
}

/// Failure of a [`Command`] that is not a regular failed [`Outcome`]
/// (e.g. the command could not be spawned at all, or panicked).
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// Executable payload of a [`Step`].
///
/// What actually runs — a shell subprocess, an in-process function, a user
/// prompt — is up to the implementor. A regular failure is expressed as an
/// [`Outcome`] with [`Status::Error`]; returning [`Err`] means the command
/// could not be executed at all.
pub trait Command: Send + Sync {
    /// Runs the command against the given [`Context`].
    fn run(&self, ctx: &mut Context) -> Result<Outcome, CommandError>;
}

/// One unit of work within a [`Scenario`].
#[derive(Clone)]
pub struct Step {
    /// 1-based, contiguous position within the owning [`Scenario`], assigned
    /// by [`Scenario::add_step()`] and never mutated afterwards.
    pub number: usize,

    /// Human-readable step text.
    pub name: String,

    /// Whether an [`Error`] status of this step is downgraded to [`Success`]
    /// (the scenario keeps going).
    ///
    /// [`Error`]: Status::Error
    /// [`Success`]: Status::Success
    pub ignore: bool,

    /// Whether a [`Command`] fault on this step lets the run continue (the
    /// step is forced to [`Error`]) instead of aborting the whole run.
    ///
    /// [`Error`]: Status::Error
    pub continue_on_failure: bool,

    /// Current execution [`Status`].
    pub status: Status,

    /// Captured standard output of the last execution.
    pub out: String,

    /// Captured error output of the last execution.
    pub err: String,

    /// Wall-clock execution time of the last execution.
    pub exec_time: Duration,

    cmd: Option<Arc<dyn Command>>,
}

impl Step {
    /// Creates a new, not yet executed [`Step`] without a [`Command`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            number: 0,
            name: name.into(),
            ignore: false,
            continue_on_failure: true,
            status: Status::NotExecuted,
            out: String::new(),
            err: String::new(),
            exec_time: Duration::ZERO,
            cmd: None,
        }
    }

    /// Attaches the executable [`Command`].
    #[must_use]
    pub fn with_cmd(mut self, cmd: Arc<dyn Command>) -> Self {
        self.cmd = Some(cmd);
        self
    }

    /// Marks this [`Step`]'s failures as ignored.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Makes a [`Command`] fault on this [`Step`] abort the whole run.
    #[must_use]
    pub fn fatal_on_failure(mut self) -> Self {
        self.continue_on_failure = false;
        self
    }

    /// Indicates whether this [`Step`] has an executable [`Command`].
    #[must_use]
    pub fn has_cmd(&self) -> bool {
        self.cmd.is_some()
    }

    /// Executes the attached [`Command`], absorbing its [`Outcome`].
    ///
    /// A [`Step`] without a [`Command`] is a [`Warning`], not an error:
    /// there was nothing to run, which is distinct from "ran and failed".
    /// Panics raised by the [`Command`] are caught and surfaced as
    /// [`CommandError`]s.
    ///
    /// [`Warning`]: Status::Warning
    pub fn run(&mut self, ctx: &mut Context) -> Result<(), CommandError> {
        let Some(cmd) = self.cmd.clone() else {
            tracing::warn!(step = %self, "no command to run");
            self.status = Status::Warning;
            self.err = "no command associated with this step".into();
            return Ok(());
        };

        self.status = Status::Running;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| cmd.run(ctx)))
            .unwrap_or_else(|panic_info| {
                let payload = panic_info
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| {
                        panic_info.downcast_ref::<&str>().map(ToString::to_string)
                    })
                    .unwrap_or_else(|| "command panicked".into());
                Err(payload.into())
            })?;

        self.status = outcome.status;
        self.out = outcome.out;
        self.err = outcome.err;
        self.exec_time = outcome.exec_time;
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} - {}", self.number, self.name)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("number", &self.number)
            .field("name", &self.name)
            .field("ignore", &self.ignore)
            .field("continue_on_failure", &self.continue_on_failure)
            .field("status", &self.status)
            .field("has_cmd", &self.cmd.is_some())
            .finish_non_exhaustive()
    }
}

/// Ordered sequence of [`Step`]s representing one runnable unit: a test, a
/// setup, a teardown or the suite-wide check.
///
/// Insertion order is execution order and is never reordered.
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    /// Whether any [`Step`] requires interactive input.
    pub attended: bool,

    steps: Vec<Step>,
}

impl Scenario {
    /// Creates an empty [`Scenario`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a [`Step`], assigning its 1-based sequence number.
    pub fn add_step(&mut self, mut step: Step) {
        step.number = self.steps.len() + 1;
        self.steps.push(step);
    }

    /// Appends a [`Step`], builder style.
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.add_step(step);
        self
    }

    /// Read access to the [`Step`]s in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Mutable access to the [`Step`]s in execution order.
    pub fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }

    /// Indicates whether this [`Scenario`] has no [`Step`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One test case: its identity, metadata and an optional [`Scenario`].
///
/// Parser-defined extension attributes (e.g. `script`, `host`) live in an
/// explicit side-table instead of dynamic dispatch.
#[derive(Clone, Debug, Default)]
pub struct Specification {
    /// Unique test name. Uniqueness is enforced by the parser, not here.
    pub name: String,

    /// One-line human-readable title.
    pub title: String,

    /// Longer description.
    pub description: String,

    /// The runnable [`Scenario`], if the specification has one.
    pub scenario: Option<Scenario>,

    attributes: HashMap<String, String>,
}

impl Specification {
    /// Creates a named [`Specification`] without a [`Scenario`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Attaches the [`Scenario`], builder style.
    #[must_use]
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Returns the extension attribute stored under `key`, if any.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Indicates whether the extension attribute `key` is present.
    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Stores an extension attribute, replacing any previous value.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attributes.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Status);

    impl Command for Fixed {
        fn run(&self, _: &mut Context) -> Result<Outcome, CommandError> {
            Ok(Outcome {
                status: self.0,
                ..Outcome::default()
            })
        }
    }

    struct Panicking;

    impl Command for Panicking {
        fn run(&self, _: &mut Context) -> Result<Outcome, CommandError> {
            panic!("boom");
        }
    }

    #[test]
    fn step_numbers_are_one_based_and_contiguous() {
        let mut scenario = Scenario::new();
        for name in ["a", "b", "c"] {
            scenario.add_step(Step::new(name));
        }
        let numbers: Vec<_> =
            scenario.steps().iter().map(|s| s.number).collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn step_without_command_warns() {
        let mut step = Step::new("nothing to do");
        step.run(&mut Context::new()).unwrap();
        assert_eq!(step.status, Status::Warning);
    }

    #[test]
    fn step_absorbs_command_outcome() {
        let mut step =
            Step::new("do it").with_cmd(Arc::new(Fixed(Status::Success)));
        step.run(&mut Context::new()).unwrap();
        assert_eq!(step.status, Status::Success);
    }

    #[test]
    fn panicking_command_surfaces_as_error() {
        let mut step = Step::new("explodes").with_cmd(Arc::new(Panicking));
        let err = step.run(&mut Context::new()).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn attribute_side_table() {
        let mut spec = Specification::new("T1");
        assert!(!spec.has_attribute("script"));
        spec.set_attribute("script", "run.sh");
        assert_eq!(spec.attribute("script"), Some("run.sh"));
    }
}
