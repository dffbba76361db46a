// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Test-execution orchestrator.
//!
//! `ordeal` runs scenario-based test specifications strictly sequentially
//! and fans execution events out to any number of reporters:
//!
//! - a [`Parser`] (supplied by the embedding application) turns test
//!   identifiers into [`Specification`]s;
//! - the [`Runner`] executes each specification's [`Scenario`] step by
//!   step, optionally wrapped by shared setup/teardown scenarios, emitting
//!   a message for every transition;
//! - the [`Dispatcher`] drains the shared event queue from a background
//!   task and re-publishes every message, in order, to all subscribed
//!   [`StreamingReporter`]s (the built-in [`Collector`] included);
//! - at run end, every [`BlockReporter`] receives the accumulated result
//!   set, followed unconditionally by the built-in [`Summary`] reporter;
//! - the [`Engine`] wires all of the above together and applies the
//!   suite-setup/suite-teardown gating semantics.
//!
//! ```no_run
//! use ordeal::{Config, Console, Engine};
//! # use ordeal::{parser, Parser, Specification};
//! #
//! # struct MyParser;
//! # impl Parser for MyParser {
//! #     fn parse_specification(
//! #         &mut self,
//! #         ident: &str,
//! #     ) -> parser::Result<Specification> {
//! #         Ok(Specification::new(ident))
//! #     }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ordeal::error::Result<()> {
//! let config = Config {
//!     tests: vec!["tests/t1".into(), "tests/t2".into()],
//!     ..Config::default()
//! };
//! let report = Engine::new(config, MyParser)
//!     .with_streaming_reporter("console", Box::new(Console::new()))
//!     .run(None)
//!     .await?;
//! assert!(!report.has_failures());
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod message;
pub mod messaging;
pub mod parser;
pub mod reporter;
pub mod runner;
pub mod spec;

pub use self::{
    collector::{Collector, ReportTestState},
    config::Config,
    dispatcher::Dispatcher,
    engine::{Engine, RunReport},
    error::Error,
    message::{Event, Message, RunnerMessage, Status},
    messaging::{Bus, Messaging},
    parser::Parser,
    reporter::{BlockReporter, Console, StreamingReporter, Summary},
    runner::{RunResult, Runner, ScenarioKind},
    spec::{
        Command, CommandError, Context, Outcome, Scenario, Specification,
        Step,
    },
};
