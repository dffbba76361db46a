// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Executor of a single [`Specification`]'s [`Scenario`].
//!
//! Steps run strictly sequentially, in insertion order. The scenario status
//! escalates to the maximum severity seen (`Skipped < Success < Warning <
//! Error`); execution halts at the first unignored [`Error`] step. A shared
//! setup [`Scenario`] gates the main one, a shared teardown [`Scenario`]
//! always runs afterwards.
//!
//! [`Error`]: Status::Error

use std::{thread, time::{Duration, SystemTime}};

use derive_more::{Display, Error};

use crate::{
    message::{RunnerMessage, Status},
    messaging::{Bus, Messaging},
    spec::{Context, Scenario, Specification, Step},
};

/// Result of running a [`Specification`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unrecoverable [`Runner`] fault. Aborts the whole run, unlike a step's
/// [`Error`] status, which is contained within its test.
///
/// [`Error`]: Status::Error
#[derive(Debug, Display, Error)]
pub enum Error {
    /// A [`Command`] fault on a step that doesn't allow continuing.
    ///
    /// [`Command`]: crate::Command
    #[display(fmt = "step {} aborted the run: {}", number, reason)]
    StepAborted {
        /// Sequence number of the aborting step.
        number: usize,

        /// Rendered command fault.
        reason: String,
    },
}

/// Whether a [`Scenario`] belongs to an ordinary test or to a
/// setup/teardown/check wrapper.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScenarioKind {
    /// Ordinary test scenario, counted by reporters.
    Test,

    /// Setup, teardown or suite-check scenario, excluded from pass/fail
    /// counts.
    Special,
}

impl ScenarioKind {
    /// Indicates whether messages of this kind carry the `is_special` mark.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(self, Self::Special)
    }
}

/// Outcome of one [`Runner::run()`] invocation.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// When the run started.
    pub start_time: SystemTime,

    /// When the run finished.
    pub stop_time: SystemTime,

    /// Monotonically increasing run counter, never reset.
    pub sequence_id: u64,

    /// Final status of the test. When a teardown [`Scenario`] is configured
    /// its status lands here, even if the main scenario fared differently.
    pub status: Status,

    /// Every [`Step`] actually executed, in execution order, including
    /// setup/teardown steps.
    pub steps: Vec<Step>,
}

/// Executes [`Specification`]s, emitting a [`RunnerMessage`] for every step
/// transition and scenario lifecycle edge.
#[derive(Debug)]
pub struct Runner {
    /// Shared setup [`Scenario`], run before every test's own scenario. An
    /// [`Error`] outcome skips the test.
    ///
    /// [`Error`]: Status::Error
    pub setup: Option<Scenario>,

    /// Shared teardown [`Scenario`], always run after the test, even when
    /// setup or the test itself failed.
    pub teardown: Option<Scenario>,

    bus: Bus,
    context: Context,
    sequence_id: u64,
    step_delay: Duration,
}

impl Messaging for Runner {
    fn bus(&self) -> &Bus {
        &self.bus
    }
}

impl Runner {
    /// Creates a [`Runner`] emitting through `bus` and threading `context`
    /// into every [`Command`] execution.
    ///
    /// [`Command`]: crate::Command
    #[must_use]
    pub fn new(bus: Bus, context: Context) -> Self {
        Self {
            setup: None,
            teardown: None,
            bus,
            context,
            sequence_id: 0,
            step_delay: Duration::ZERO,
        }
    }

    /// Sets the pacing delay between a step's `started` message and its
    /// execution. Zero by default; not load-bearing.
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Read access to the execution [`Context`].
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Runs the given [`Specification`].
    ///
    /// Sequencing: `started` edge, shared setup (gating), the
    /// specification's own [`Scenario`], shared teardown (unconditional,
    /// overwrites the final status), `finished` edge.
    ///
    /// # Errors
    ///
    /// Only when a [`Command`] fault hits a step that doesn't allow
    /// continuing; every other failure is contained in the returned
    /// [`RunResult::status`].
    ///
    /// [`Command`]: crate::Command
    pub fn run(
        &mut self,
        spec: &mut Specification,
        kind: ScenarioKind,
    ) -> Result<RunResult> {
        let start_time = SystemTime::now();
        self.sequence_id += 1;
        let sequence_id = self.sequence_id;
        let test = spec.name.clone();

        self.lifecycle(&test, "started", Status::Started, kind);

        let mut executed = Vec::new();
        let mut status;

        let setup_failed = match self.setup.clone() {
            Some(mut scenario) => {
                self.lifecycle(&test, "setup", Status::Running, kind);
                let st = self.run_scenario(
                    &test,
                    &mut scenario,
                    ScenarioKind::Special,
                    &mut executed,
                )?;
                st == Status::Error
            }
            None => false,
        };

        if setup_failed {
            self.error(&test, "setup failed, test will not run");
            status = Status::Error;
        } else {
            self.lifecycle(&test, "running", Status::Running, kind);
            status = match spec.scenario.as_mut() {
                Some(scenario) => self.run_scenario(
                    &test,
                    scenario,
                    kind,
                    &mut executed,
                )?,
                None => {
                    self.error(&test, "specification has no scenario");
                    Status::Error
                }
            };
        }

        if let Some(mut scenario) = self.teardown.clone() {
            self.lifecycle(&test, "teardown", Status::Running, kind);
            // Teardown's status intentionally overwrites the final one,
            // even downgrading a passing test. Documented behavior.
            status = self.run_scenario(
                &test,
                &mut scenario,
                ScenarioKind::Special,
                &mut executed,
            )?;
        }

        self.context.set("status", status.to_string());
        self.lifecycle(&test, "finished", status, kind);

        Ok(RunResult {
            start_time,
            stop_time: SystemTime::now(),
            sequence_id,
            status,
            steps: executed,
        })
    }

    /// Runs every [`Step`] of `scenario` in order, collecting the executed
    /// ones into `executed` and returning the escalated scenario status.
    fn run_scenario(
        &mut self,
        test: &str,
        scenario: &mut Scenario,
        kind: ScenarioKind,
        executed: &mut Vec<Step>,
    ) -> Result<Status> {
        if scenario.is_empty() {
            self.error(test, "scenario contains no steps");
            return Ok(Status::Error);
        }

        let mut status = Status::Skipped;
        for step in scenario.steps_mut() {
            self.message(RunnerMessage {
                test: test.into(),
                text: step.to_string(),
                timestamp: SystemTime::now(),
                status: Status::Started,
                duration: Duration::ZERO,
                out: String::new(),
                err: String::new(),
                is_special: kind.is_special(),
                number: step.number,
            });
            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }

            if let Err(fault) = step.run(&mut self.context) {
                if step.continue_on_failure {
                    step.status = Status::Error;
                    step.err = fault.to_string();
                } else {
                    return Err(Error::StepAborted {
                        number: step.number,
                        reason: fault.to_string(),
                    });
                }
            }
            if step.status == Status::Error && step.ignore {
                tracing::debug!(step = %step, "error ignored");
                step.status = Status::Success;
            }

            self.message(RunnerMessage {
                test: test.into(),
                text: step.to_string(),
                timestamp: SystemTime::now(),
                status: step.status,
                duration: step.exec_time,
                out: step.out.clone(),
                err: step.err.clone(),
                is_special: kind.is_special(),
                number: step.number,
            });

            executed.push(step.clone());
            status = status.max(step.status);
            if step.status == Status::Error {
                break;
            }
        }
        Ok(status)
    }

    fn lifecycle(
        &self,
        test: &str,
        text: &str,
        status: Status,
        kind: ScenarioKind,
    ) {
        self.message(RunnerMessage::lifecycle(
            test,
            text,
            status,
            kind.is_special(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::channel::mpsc;

    use super::*;
    use crate::{
        message::Event,
        spec::{Command, CommandError, Outcome},
    };

    struct Fixed(Status);

    impl Command for Fixed {
        fn run(
            &self,
            _: &mut Context,
        ) -> std::result::Result<Outcome, CommandError> {
            Ok(Outcome {
                status: self.0,
                exec_time: Duration::from_millis(10),
                ..Outcome::default()
            })
        }
    }

    struct Faulty;

    impl Command for Faulty {
        fn run(
            &self,
            _: &mut Context,
        ) -> std::result::Result<Outcome, CommandError> {
            Err("spawn failed".into())
        }
    }

    fn step(status: Status) -> Step {
        Step::new(format!("{status}")).with_cmd(Arc::new(Fixed(status)))
    }

    fn scenario(statuses: &[Status]) -> Scenario {
        let mut sc = Scenario::new();
        for st in statuses {
            sc.add_step(step(*st));
        }
        sc
    }

    fn runner() -> (Runner, mpsc::UnboundedReceiver<Event>) {
        let (bus, rx) = Bus::channel();
        (Runner::new(bus, Context::new()), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(Some(ev)) = rx.try_next() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn status_escalates_to_max_severity() {
        let (mut runner, _rx) = runner();
        let mut spec = Specification::new("T")
            .with_scenario(scenario(&[Status::Success, Status::Warning, Status::Success]));
        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Warning);
        assert_eq!(result.steps.len(), 3);
    }

    #[test]
    fn halts_at_first_unignored_error() {
        // [success, warning, error(ignore=false), success]:
        // first 3 steps execute, final status is error.
        let (mut runner, _rx) = runner();
        let mut spec = Specification::new("T").with_scenario(scenario(&[
            Status::Success,
            Status::Warning,
            Status::Error,
            Status::Success,
        ]));
        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(
            spec.scenario.as_ref().unwrap().steps()[3].status,
            Status::NotExecuted,
        );
    }

    #[test]
    fn ignored_error_downgrades_and_continues() {
        // [success, error(ignore=true), success]: all 3 execute, success.
        let (mut runner, _rx) = runner();
        let mut sc = Scenario::new();
        sc.add_step(step(Status::Success));
        sc.add_step(step(Status::Error).ignored());
        sc.add_step(step(Status::Success));
        let mut spec = Specification::new("T").with_scenario(sc);

        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Success);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[1].status, Status::Success);
    }

    #[test]
    fn empty_scenario_is_an_error() {
        let (mut runner, mut rx) = runner();
        let mut spec =
            Specification::new("T").with_scenario(Scenario::new());
        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Error);

        let errors: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|ev| matches!(ev, Event::Error(_)))
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn missing_scenario_is_an_error() {
        let (mut runner, mut rx) = runner();
        let mut spec = Specification::new("T");
        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Error);
        assert!(drain(&mut rx)
            .iter()
            .any(|ev| matches!(ev, Event::Error(_))));
    }

    #[test]
    fn failed_setup_skips_main_scenario_but_not_teardown() {
        let (mut runner, mut rx) = runner();
        runner.setup = Some(scenario(&[Status::Error]));
        runner.teardown = Some(scenario(&[Status::Success]));
        let mut spec =
            Specification::new("T").with_scenario(scenario(&[Status::Success]));

        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();

        // The main scenario never executed.
        assert_eq!(
            spec.scenario.as_ref().unwrap().steps()[0].status,
            Status::NotExecuted,
        );
        // Teardown ran and, as documented, its status is the final one.
        assert_eq!(result.status, Status::Success);
        assert_eq!(result.steps.len(), 2);
        assert!(drain(&mut rx).iter().any(|ev| matches!(
            ev,
            Event::Error(m) if m.text.contains("setup failed")
        )));
    }

    #[test]
    fn teardown_overwrites_a_passing_status() {
        let (mut runner, _rx) = runner();
        runner.teardown = Some(scenario(&[Status::Warning]));
        let mut spec =
            Specification::new("T").with_scenario(scenario(&[Status::Success]));
        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Warning);
        assert_eq!(runner.context().get("status"), Some("warning"));
    }

    #[test]
    fn command_fault_is_contained_when_step_continues() {
        let (mut runner, _rx) = runner();
        let mut sc = Scenario::new();
        sc.add_step(Step::new("broken").with_cmd(Arc::new(Faulty)));
        let mut spec = Specification::new("T").with_scenario(sc);
        let result = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(result.status, Status::Error);
        assert!(result.steps[0].err.contains("spawn failed"));
    }

    #[test]
    fn command_fault_aborts_when_step_is_fatal() {
        let (mut runner, _rx) = runner();
        let mut sc = Scenario::new();
        sc.add_step(
            Step::new("broken").with_cmd(Arc::new(Faulty)).fatal_on_failure(),
        );
        let mut spec = Specification::new("T").with_scenario(sc);
        let err = runner.run(&mut spec, ScenarioKind::Test).unwrap_err();
        assert!(matches!(err, Error::StepAborted { number: 1, .. }));
    }

    #[test]
    fn sequence_id_increases_and_is_never_reset() {
        let (mut runner, _rx) = runner();
        let mut spec =
            Specification::new("T").with_scenario(scenario(&[Status::Success]));
        let first = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        let second = runner.run(&mut spec, ScenarioKind::Test).unwrap();
        assert_eq!(first.sequence_id, 1);
        assert_eq!(second.sequence_id, 2);
    }

    #[test]
    fn emits_lifecycle_edges_in_order() {
        let (mut runner, mut rx) = runner();
        runner.setup = Some(scenario(&[Status::Success]));
        runner.teardown = Some(scenario(&[Status::Success]));
        let mut spec =
            Specification::new("T").with_scenario(scenario(&[Status::Success]));
        runner.run(&mut spec, ScenarioKind::Test).unwrap();

        let edges: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|ev| match ev {
                Event::Runner(m) if m.number == 0 => Some(m.text),
                _ => None,
            })
            .collect();
        assert_eq!(
            edges,
            ["started", "setup", "running", "teardown", "finished"],
        );
    }
}
