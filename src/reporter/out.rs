// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for writing terminal output.

use std::borrow::Cow;

use console::Style;

use crate::message::Status;

/// [`Style`]s for terminal output.
#[derive(Debug)]
pub struct Styles {
    /// [`Style`] for rendering successful events.
    pub ok: Style,

    /// [`Style`] for rendering warnings.
    pub warn: Style,

    /// [`Style`] for rendering errors and failed events.
    pub err: Style,

    /// [`Style`] for rendering skipped events.
    pub skipped: Style,

    /// [`Style`] for rendering headers.
    pub header: Style,

    /// [`Style`] for rendering __bold__.
    pub bold: Style,

    /// Indicates whether a color-capable terminal was detected.
    pub is_present: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            err: Style::new().red(),
            skipped: Style::new().cyan(),
            header: Style::new().blue(),
            bold: Style::new().bold(),
            is_present: console::colors_enabled(),
        }
    }
}

impl Styles {
    /// Creates new [`Styles`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Colors `input` with [`Styles::ok`] if a terminal is present, leaves
    /// it "as is" otherwise.
    #[must_use]
    pub fn ok<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.ok, input.into())
    }

    /// Colors `input` with [`Styles::warn`] if a terminal is present, leaves
    /// it "as is" otherwise.
    #[must_use]
    pub fn warn<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.warn, input.into())
    }

    /// Colors `input` with [`Styles::err`] if a terminal is present, leaves
    /// it "as is" otherwise.
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.err, input.into())
    }

    /// Colors `input` with [`Styles::skipped`] if a terminal is present,
    /// leaves it "as is" otherwise.
    #[must_use]
    pub fn skipped<'a>(
        &self,
        input: impl Into<Cow<'a, str>>,
    ) -> Cow<'a, str> {
        self.apply(&self.skipped, input.into())
    }

    /// Colors `input` with [`Styles::header`] if a terminal is present,
    /// leaves it "as is" otherwise.
    #[must_use]
    pub fn header<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.header, input.into())
    }

    /// Makes `input` __bold__ if a terminal is present, leaves it "as is"
    /// otherwise.
    #[must_use]
    pub fn bold<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.apply(&self.bold, input.into())
    }

    /// Colors `input` according to the given [`Status`].
    #[must_use]
    pub fn status<'a>(
        &self,
        status: Status,
        input: impl Into<Cow<'a, str>>,
    ) -> Cow<'a, str> {
        match status {
            Status::Success => self.ok(input),
            Status::Warning => self.warn(input),
            Status::Error => self.err(input),
            Status::Skipped => self.skipped(input),
            _ => input.into(),
        }
    }

    fn apply<'a>(&self, style: &Style, input: Cow<'a, str>) -> Cow<'a, str> {
        if self.is_present {
            style.apply_to(input).to_string().into()
        } else {
            input
        }
    }
}
