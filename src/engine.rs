// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level suite coordinator.
//!
//! Drives one run end to end: start the [`Dispatcher`], parse the
//! configured [`Specification`]s, apply the suite-setup gate, execute every
//! test through the [`Runner`] (wrapped by the per-test setup/teardown),
//! run the suite teardown unconditionally, then flush the pipeline and
//! trigger the report phase.

use linked_hash_map::LinkedHashMap;

use crate::{
    collector::ReportTestState,
    config::Config,
    dispatcher::Dispatcher,
    error::{Error, Result},
    message::{Message, Status},
    messaging::{Bus, Messaging},
    parser::{self, Parser},
    reporter::{BlockReporter, StreamingReporter},
    runner::{self, Runner, ScenarioKind},
    spec::Specification,
};

/// Final result set of a suite run, recovered from the [`Collector`].
///
/// [`Collector`]: crate::Collector
#[derive(Debug)]
pub struct RunReport {
    /// Per-test rollups, keyed by test name in first-seen order.
    pub states: LinkedHashMap<String, ReportTestState>,

    /// Every error message emitted during the run.
    pub errors: Vec<Message>,
}

impl RunReport {
    /// Indicates whether any ordinary test failed or any error message was
    /// emitted.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
            || self
                .states
                .values()
                .any(|s| !s.is_special && s.status == Status::Error)
    }
}

/// The four specifications wrapped around the ordinary tests.
#[derive(Default)]
struct Specials {
    setup: Option<Specification>,
    teardown: Option<Specification>,
    suite_setup: Option<Specification>,
    suite_teardown: Option<Specification>,
}

/// Top-level executor: parse → run → report.
pub struct Engine<P> {
    config: Config,
    parser: P,
    runner: Runner,
    dispatcher: Dispatcher,
    bus: Bus,
}

impl<P> Messaging for Engine<P> {
    fn bus(&self) -> &Bus {
        &self.bus
    }
}

impl<P: Parser> Engine<P> {
    /// Creates an [`Engine`] out of a validated [`Config`] and a [`Parser`].
    #[must_use]
    pub fn new(config: Config, parser: P) -> Self {
        let dispatcher =
            Dispatcher::new().with_grace_period(config.shutdown_grace);
        let bus = dispatcher.bus();
        let runner = Runner::new(bus.clone(), config.context.clone())
            .with_step_delay(config.step_delay);
        Self {
            config,
            parser,
            runner,
            dispatcher,
            bus,
        }
    }

    /// Registers a streaming reporter under `name`.
    #[must_use]
    pub fn with_streaming_reporter(
        mut self,
        name: impl Into<String>,
        reporter: Box<dyn StreamingReporter>,
    ) -> Self {
        self.dispatcher.add_streaming_reporter(name, reporter);
        self
    }

    /// Registers a batch reporter. The built-in [`Summary`] reporter always
    /// runs last, regardless of what is registered here.
    ///
    /// [`Summary`]: crate::reporter::Summary
    #[must_use]
    pub fn with_block_reporter(
        mut self,
        reporter: Box<dyn BlockReporter>,
    ) -> Self {
        self.dispatcher.add_block_reporter(reporter);
        self
    }

    /// Runs the whole suite, or the single test named by `test_identifier`.
    ///
    /// # Errors
    ///
    /// - [`Error::Parser`] when any specification fails to parse (the parse
    ///   phase aborts; nothing runs, nothing is reported);
    /// - [`Error::NoSpecifications`] when the resolved specification list is
    ///   empty (nothing is reported);
    /// - [`Error::Runner`] when a step fault aborts the whole run.
    ///
    /// A failing test is not an error: it lands in the returned
    /// [`RunReport`] and in whatever the reporters produced.
    pub async fn run(
        mut self,
        test_identifier: Option<&str>,
    ) -> Result<RunReport> {
        self.dispatcher.run();
        self.message("start");

        let parsed = self.parse_specifications(test_identifier);
        let (mut specs, mut specials) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                self.dispatcher.exit().await;
                return Err(e.into());
            }
        };
        if specs.is_empty() {
            self.dispatcher.exit().await;
            return Err(Error::NoSpecifications);
        }

        self.message("running");
        if let Err(e) = self.execute(&mut specs, &mut specials) {
            self.dispatcher.exit().await;
            return Err(e.into());
        }

        self.message("end");
        self.dispatcher.exit().await;
        self.dispatcher.report(&specs);

        let (states, errors) = self.dispatcher.take_collector().into_parts();
        Ok(RunReport { states, errors })
    }

    /// Suite-setup gate, ordinary tests, unconditional suite teardown.
    fn execute(
        &mut self,
        specs: &mut [Specification],
        specials: &mut Specials,
    ) -> runner::Result<()> {
        let gate_open = match specials.suite_setup.as_mut() {
            Some(check) => {
                tracing::info!(check = %check.name, "running suite setup");
                let result = self.runner.run(check, ScenarioKind::Special)?;
                if result.status == Status::Success {
                    true
                } else {
                    self.error(
                        check.name.clone(),
                        "suite setup failed, no tests will run",
                    );
                    false
                }
            }
            None => true,
        };

        if gate_open {
            self.runner.setup =
                specials.setup.take().and_then(|s| s.scenario);
            self.runner.teardown =
                specials.teardown.take().and_then(|s| s.scenario);
            for spec in specs.iter_mut() {
                self.runner.run(spec, ScenarioKind::Test)?;
            }
        }

        if let Some(teardown) = specials.suite_teardown.as_mut() {
            tracing::info!(teardown = %teardown.name, "running suite teardown");
            self.runner.run(teardown, ScenarioKind::Special)?;
        }
        Ok(())
    }

    /// Parses the special specifications plus either the whole configured
    /// test list or the single identified test.
    ///
    /// An identifier matching neither the test list nor a special path
    /// produces an error message and an empty list, not a parse failure.
    fn parse_specifications(
        &mut self,
        test_identifier: Option<&str>,
    ) -> parser::Result<(Vec<Specification>, Specials)> {
        let specials = Specials {
            setup: self.parse_special(self.config.setup.clone())?,
            teardown: self.parse_special(self.config.teardown.clone())?,
            suite_setup: self.parse_special(self.config.suite_setup.clone())?,
            suite_teardown: self
                .parse_special(self.config.suite_teardown.clone())?,
        };

        let mut specs = Vec::new();
        match test_identifier {
            Some(ident) => {
                if self.is_configured(ident) {
                    specs.push(self.parse_one(ident)?);
                } else {
                    self.error(
                        ident,
                        "does not match any configured test or special path",
                    );
                }
            }
            None => {
                for ident in self.config.tests.clone() {
                    specs.push(self.parse_one(&ident)?);
                }
            }
        }
        Ok((specs, specials))
    }

    fn parse_special(
        &mut self,
        ident: Option<String>,
    ) -> parser::Result<Option<Specification>> {
        ident.map(|ident| self.parse_one(&ident)).transpose()
    }

    fn parse_one(&mut self, ident: &str) -> parser::Result<Specification> {
        self.parser
            .parse_specification(ident)
            .map_err(|e| e.in_file(ident))
    }

    fn is_configured(&self, ident: &str) -> bool {
        self.config.tests.iter().any(|t| t == ident)
            || [
                &self.config.setup,
                &self.config.teardown,
                &self.config.suite_setup,
                &self.config.suite_teardown,
            ]
            .into_iter()
            .any(|path| path.as_deref() == Some(ident))
    }
}
