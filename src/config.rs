// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Already-validated run configuration consumed by the [`Engine`].
//!
//! Loading and validating configuration (files, CLI flags) is external to
//! this crate.
//!
//! [`Engine`]: crate::Engine

use std::time::Duration;

use smart_default::SmartDefault;

use crate::{dispatcher::Dispatcher, spec::Context};

/// Validated configuration of one suite run.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Identifiers of the test specifications to run, in order.
    pub tests: Vec<String>,

    /// Identifier of the per-test setup specification, wrapped around every
    /// individual test.
    pub setup: Option<String>,

    /// Identifier of the per-test teardown specification, wrapped around
    /// every individual test.
    pub teardown: Option<String>,

    /// Identifier of the suite-wide check specification, run once before
    /// all ordinary tests. Its failure cancels the run.
    pub suite_setup: Option<String>,

    /// Identifier of the suite teardown specification, run once after all
    /// ordinary tests, unconditionally.
    pub suite_teardown: Option<String>,

    /// Free-form key/value bag passed through to commands and reporters.
    pub context: Context,

    /// Pacing delay between a step's `started` message and its execution.
    #[default(Duration::ZERO)]
    pub step_delay: Duration,

    /// Grace period granted to streaming reporters on shutdown.
    #[default(Dispatcher::DEFAULT_GRACE)]
    pub shutdown_grace: Duration,
}
