// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Contracts for outputting execution [`Event`]s.
//!
//! Reporters come in two flavors:
//! - streaming ([`StreamingReporter`]): pushed every [`Event`] incrementally
//!   from a private queue owned by the [`Dispatcher`];
//! - batch ([`BlockReporter`]): pulled once at run end with the complete
//!   accumulated result set.
//!
//! [`Dispatcher`]: crate::Dispatcher

pub mod console;
pub mod out;
pub mod summary;

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use linked_hash_map::LinkedHashMap;

use crate::{
    collector::ReportTestState,
    message::{Event, Message},
    spec::Specification,
};

#[doc(inline)]
pub use self::{console::Console, summary::Summary};

/// Result of a reporting operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Reporter-subsystem fault.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Underlying output failed.
    #[display(fmt = "i/o failure: {}", _0)]
    Io(std::io::Error),

    /// Anything else a reporter implementation wants to surface.
    #[display(fmt = "{}", _0)]
    Custom(#[error(not(source))] String),
}

/// Subscriber processing [`Event`]s incrementally as they occur.
///
/// The [`Dispatcher`] owns the consumption loop: it delivers every
/// dispatched [`Event`] exactly once, in global push order, and drains the
/// private queue on shutdown before stopping the reporter.
///
/// [`Dispatcher`]: crate::Dispatcher
#[async_trait]
pub trait StreamingReporter: Send {
    /// Handles one [`Event`].
    async fn update(&mut self, ev: Event);
}

#[async_trait]
impl StreamingReporter for Box<dyn StreamingReporter> {
    async fn update(&mut self, ev: Event) {
        (**self).update(ev).await;
    }
}

/// Subscriber processing the complete accumulated result set once, at run
/// end.
pub trait BlockReporter: Send {
    /// Reports on the whole run.
    ///
    /// `specs` are the parsed [`Specification`]s in execution order,
    /// `states` the per-test rollups keyed by test name (first-seen order)
    /// and `errors` every error message emitted during the run.
    ///
    /// # Errors
    ///
    /// Reporter failures are isolated by the [`Dispatcher`]: they are logged
    /// and the remaining reporters still run.
    ///
    /// [`Dispatcher`]: crate::Dispatcher
    fn report(
        &mut self,
        specs: &[Specification],
        states: &LinkedHashMap<String, ReportTestState>,
        errors: &[Message],
    ) -> Result<()>;
}
