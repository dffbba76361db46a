// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Default [`StreamingReporter`] printing every event to the terminal.

use async_trait::async_trait;

use crate::{
    message::{Event, Status},
    reporter::{out::Styles, StreamingReporter},
};

/// Streaming reporter printing [`Event`]s to standard output as they occur.
#[derive(Debug, Default)]
pub struct Console {
    styles: Styles,
    verbose: bool,
}

impl Console {
    /// Creates a new [`Console`] reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also prints setup/teardown/check entries and intermediate step
    /// transitions, which are hidden by default.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

#[async_trait]
impl StreamingReporter for Console {
    async fn update(&mut self, ev: Event) {
        match &ev {
            Event::Plain(m) => println!("{}", self.styles.header(m.to_string())),
            Event::Error(_) => println!("{}", self.styles.err(ev.to_string())),
            Event::Runner(m) => {
                let intermediate = matches!(
                    m.status,
                    Status::Started | Status::Running | Status::NotExecuted,
                );
                if (m.is_special || intermediate) && !self.verbose {
                    return;
                }
                let line = format!("{} - {}", m, m.status);
                println!("{}", self.styles.status(m.status, line));
                if self.verbose && !m.out.is_empty() {
                    println!("{}", m.out);
                }
                if !m.err.is_empty() {
                    println!("{}", self.styles.err(m.err.clone()));
                }
            }
        }
    }
}
