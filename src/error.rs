// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`Error`] type for tree-building errors.

use std::fmt;

/// An error type used to report hard failures while building or
/// querying a [`Tree`](crate::Tree).
///
/// Ordinary absence (a domain that was never configured, or a node
/// that carries no data) is not an error; lookups report it as
/// [`None`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// A label was longer than 63 octets.
    LabelTooLong,

    /// Allocating a node, an interned label, or child-index storage
    /// failed.
    OutOfMemory,

    /// Growing a child index would make its capacity unrepresentable
    /// as a 32-bit count.
    IndexOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::LabelTooLong => f.write_str("label is longer than 63 bytes"),
            Self::OutOfMemory => f.write_str("memory allocation failed"),
            Self::IndexOverflow => f.write_str("child index capacity overflow"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
