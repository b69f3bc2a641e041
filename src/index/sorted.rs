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

//! Implementation of the [`SortedIndex`] child-index strategy.

use std::iter::FusedIterator;
use std::slice;

use log::debug;

use super::{grown_capacity, ChildIndex};
use crate::label::Label;
use crate::tree::NodeId;
use crate::Error;

/// A vector of children kept sorted by label and searched by
/// bisection.
///
/// Insertion shifts the tail of the vector right by one entry to keep
/// the order. When the vector is full, its capacity doubles (or becomes
/// one, for the first child).
#[derive(Debug, Default)]
pub struct SortedIndex {
    entries: Vec<(Label, NodeId)>,
}

impl SortedIndex {
    /// Finds `label`, returning `Ok` with its position if present and
    /// `Err` with its insertion point otherwise.
    fn search(&self, label: &[u8]) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(entry, _)| entry.octets().cmp(label))
    }

    /// Doubles the capacity of the entry vector. On failure, the vector
    /// is left as it was.
    fn grow(&mut self) -> Result<(), Error> {
        let new_capacity = grown_capacity(self.entries.capacity(), 1)?;
        if new_capacity >= 64 {
            debug!("Growing a sorted child index to {} entries.", new_capacity);
        }
        self.entries.try_reserve_exact(new_capacity - self.entries.len())?;
        Ok(())
    }
}

impl ChildIndex for SortedIndex {
    type Children<'a> = Children<'a>;

    fn lookup(&self, label: &[u8]) -> Option<NodeId> {
        self.search(label).ok().map(|i| self.entries[i].1)
    }

    fn find_or_create<F>(&mut self, label: &[u8], create: F) -> Result<NodeId, Error>
    where
        F: FnOnce() -> Result<(Label, NodeId), Error>,
    {
        match self.search(label) {
            Ok(i) => Ok(self.entries[i].1),
            Err(i) => {
                if self.entries.len() == self.entries.capacity() {
                    self.grow()?;
                }
                let (label, child) = create()?;
                self.entries.insert(i, (label, child));
                Ok(child)
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    fn children(&self) -> Self::Children<'_> {
        Children {
            entries: self.entries.iter(),
        }
    }
}

/// An iterator over the children in a [`SortedIndex`], in label order.
pub struct Children<'a> {
    entries: slice::Iter<'a, (Label, NodeId)>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(_, child)| *child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl FusedIterator for Children<'_> {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
