// Copyright (c) 2024  ordeal developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Contract for sourcing [`Specification`]s.
//!
//! Parsing internals (file formats, attribute extraction) are external to
//! this crate; the [`Engine`] only relies on this trait.
//!
//! [`Engine`]: crate::Engine

use derive_more::{Display, Error};

use crate::spec::Specification;

/// Result of parsing a test specification.
pub type Result<T> = std::result::Result<T, Error>;

/// Source of parsed [`Specification`]s.
pub trait Parser {
    /// Parses the specification identified by `ident` (a configured test
    /// path or raw specification text).
    ///
    /// # Errors
    ///
    /// On malformed input.
    fn parse_specification(&mut self, ident: &str) -> Result<Specification>;
}

/// [`Parser`] error.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// The specification text or file is malformed.
    #[display(fmt = "failed to parse specification: {}", _0)]
    Syntax(#[error(not(source))] String),

    /// A parse failure re-raised with the file context added.
    #[display(fmt = "{}: {}", path, source)]
    InFile {
        /// Path of the offending specification file.
        path: String,

        /// The underlying parse failure.
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps this error with the file context it occurred in.
    #[must_use]
    pub fn in_file(self, path: impl Into<String>) -> Self {
        Self::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_context_is_prepended() {
        let err = Error::Syntax("unexpected token".into())
            .in_file("tests/t1.spec");
        assert_eq!(
            err.to_string(),
            "tests/t1.spec: failed to parse specification: unexpected token",
        );
    }
}
