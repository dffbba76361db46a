// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level error type of a suite run.
//!
//! Only configuration/structural problems surface here: a malformed
//! specification, an empty test list, a runner abort. A single test's
//! failure is a data value ([`Status::Error`]) contained in its result, and
//! never fatal to the suite.
//!
//! [`Status::Error`]: crate::Status::Error

use derive_more::{Display, Error, From};

use crate::{parser, reporter, runner};

/// Result of a whole suite run.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal suite-run failure.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A specification could not be parsed; aborts the parse phase.
    #[display(fmt = "parsing failed: {}", _0)]
    Parser(parser::Error),

    /// Unexpected internal [`Runner`] fault.
    ///
    /// [`Runner`]: crate::Runner
    #[display(fmt = "runner fault: {}", _0)]
    Runner(runner::Error),

    /// Reporter-subsystem fault.
    #[display(fmt = "reporting failed: {}", _0)]
    Report(reporter::Error),

    /// The resolved specification list was empty; nothing was run and no
    /// report was produced.
    #[display(fmt = "no specifications to run")]
    #[from(ignore)]
    NoSpecifications,
}
