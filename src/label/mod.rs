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

//! Labels: the [`Label`] type stored in the tree and the [`LabelIter`]
//! that splits domains into labels.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

mod iter;
pub use iter::LabelIter;

/// The maximum length of a label in a domain name.
pub const MAX_LABEL_LEN: usize = 63;

/// The domain string that denotes the root of the tree itself.
pub const ROOT_SENTINEL: &str = "#";

////////////////////////////////////////////////////////////////////////
// LABELS                                                             //
////////////////////////////////////////////////////////////////////////

/// The label given to a node in the tree.
///
/// A `Label` is a shared, immutable handle to octets owned by the
/// [`Interner`](crate::intern::Interner) of the tree that created it.
/// Cloning a `Label` never copies the octets, and all of the nodes of
/// one tree that carry the same label text share a single allocation.
///
/// Unlike labels in the DNS proper, comparisons between `Label`s are
/// octet-for-octet: case handling is left to whoever builds the tree.
#[derive(Clone)]
pub struct Label {
    octets: Arc<[u8]>,
}

#[allow(clippy::len_without_is_empty)] // Following DNS terminology, we have is_null().
impl Label {
    /// Wraps up interned octets. The caller must have checked the
    /// length already.
    pub(crate) fn from_shared(octets: Arc<[u8]>) -> Self {
        debug_assert!(octets.len() <= MAX_LABEL_LEN);
        Self { octets }
    }

    /// Returns whether this `Label` is the null (zero-length) label.
    pub fn is_null(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the number of octets in this `Label`.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the octets of this `Label`.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Returns whether two `Label`s share the same backing storage.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.octets, &other.octets)
    }
}

impl Deref for Label {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.octets
    }
}

impl Borrow<[u8]> for Label {
    fn borrow(&self) -> &[u8] {
        &self.octets
    }
}

/// When a `Label` is displayed, periods, backslashes, and octets that
/// are not ASCII graphic characters are escaped in accordance with
/// RFC 1035 § 5.1:
/// * Periods are escaped `\.`;
/// * backslashes are escaped `\\`;
/// * all other ASCII graphic characters are not escaped; and
/// * all other octets are escaped `\xyz`, where `xyz` is the
///   three-digit zero-padded decimal representation of the octet.
///
/// Since the [`LabelIter`] splits on every period, a displayed label
/// never actually contains `\.`; the escape is kept so that the output
/// is always valid presentation format.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_escaped(self.octets(), f)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// Writes `octets` in escaped presentation format. See the
/// [`Display`](fmt::Display) implementation of [`Label`].
pub(crate) fn write_escaped(octets: &[u8], f: &mut impl fmt::Write) -> fmt::Result {
    for octet in octets {
        if *octet == b'.' {
            f.write_str("\\.")?;
        } else if *octet == b'\\' {
            f.write_str("\\\\")?;
        } else if octet.is_ascii_graphic() {
            f.write_char(*octet as char)?;
        } else {
            write!(f, "\\{:03}", *octet)?;
        }
    }
    Ok(())
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.octets() == other.octets()
    }
}

impl Eq for Label {}

impl PartialEq<[u8]> for Label {
    fn eq(&self, other: &[u8]) -> bool {
        self.octets() == other
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `Label`s are ordered as unsigned left-justified octet strings.
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.octets().cmp(other.octets())
    }
}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.octets().hash(state)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
