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

//! Child indexes: the per-node maps from label text to child node.
//!
//! Two interchangeable strategies implement the [`ChildIndex`] trait:
//!
//! * [`HashIndex`] is an open-addressing hash table with linear
//!   probing, kept at most half full. Lookups take expected constant
//!   time per tree level.
//! * [`SortedIndex`] keeps its entries in a vector sorted by label and
//!   searches it by bisection. Lookups take logarithmic time and
//!   insertions linear time, but the memory overhead is lower, which
//!   suits the many small fan-outs found in typical domain trees.
//!
//! Callers cannot observe which strategy is in use except through
//! performance (and [`ChildIndex::capacity`]).
//!
//! Since the tree never removes nodes, neither index supports removal.
//! In particular, the hash table's probing scheme has no tombstones and
//! would need them before removal could be added.

use crate::label::Label;
use crate::tree::NodeId;
use crate::Error;

mod hash;
mod sorted;
pub use hash::{HashIndex, INITIAL_CAPACITY};
pub use sorted::SortedIndex;

/// The interface shared by all child-index strategies.
///
/// The default value of an implementation must be an empty index that
/// has not allocated any storage; the [`Tree`](crate::Tree) relies on
/// this to create leaf nodes cheaply.
pub trait ChildIndex: Default {
    /// The iterator type returned by [`ChildIndex::children`].
    type Children<'a>: Iterator<Item = NodeId>
    where
        Self: 'a;

    /// Returns the child whose label is `label`, if there is one.
    fn lookup(&self, label: &[u8]) -> Option<NodeId>;

    /// Returns the child whose label is `label`, creating it with
    /// `create` if there is none.
    ///
    /// `create` is called only when the label is absent, and only after
    /// any growth of the index has succeeded. It returns the interned
    /// label (which must equal `label`) and the new child. If growth or
    /// `create` fails, the error is returned and the index still holds
    /// exactly the children it held before the call.
    fn find_or_create<F>(&mut self, label: &[u8], create: F) -> Result<NodeId, Error>
    where
        F: FnOnce() -> Result<(Label, NodeId), Error>;

    /// Returns the number of children in the index.
    fn len(&self) -> usize;

    /// Returns whether the index has no children.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries the index can hold in its current
    /// storage.
    fn capacity(&self) -> usize;

    /// Returns an iterator over the children in the index.
    fn children(&self) -> Self::Children<'_>;
}

/// Computes the capacity that storage of `current` entries grows to:
/// `initial` for empty storage, and double the current capacity
/// otherwise. Capacities must be representable as 32-bit counts.
fn grown_capacity(current: usize, initial: usize) -> Result<usize, Error> {
    if current == 0 {
        return Ok(initial);
    }
    u32::try_from(current)
        .ok()
        .and_then(|current| current.checked_mul(2))
        .map(|doubled| doubled as usize)
        .ok_or(Error::IndexOverflow)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn label(octets: &[u8]) -> Label {
        Label::from_shared(Arc::from(octets))
    }

    /// Inserts `text` as a new child numbered `id` and returns the
    /// child that the index reports.
    fn insert<I: ChildIndex>(index: &mut I, text: &[u8], id: usize) -> NodeId {
        index
            .find_or_create(text, || Ok((label(text), NodeId(id))))
            .unwrap()
    }

    fn finds_what_it_stores<I: ChildIndex>() {
        let mut index = I::default();
        assert!(index.is_empty());
        assert_eq!(index.capacity(), 0);
        assert_eq!(index.lookup(b"com"), None);

        assert_eq!(insert(&mut index, b"com", 1), NodeId(1));
        assert_eq!(insert(&mut index, b"org", 2), NodeId(2));
        assert_eq!(insert(&mut index, b"", 3), NodeId(3));
        assert_eq!(index.len(), 3);
        assert_eq!(index.lookup(b"com"), Some(NodeId(1)));
        assert_eq!(index.lookup(b"org"), Some(NodeId(2)));
        assert_eq!(index.lookup(b""), Some(NodeId(3)));
        assert_eq!(index.lookup(b"net"), None);
        assert_eq!(index.lookup(b"COM"), None);
    }

    fn does_not_recreate_existing_children<I: ChildIndex>() {
        let mut index = I::default();
        insert(&mut index, b"example", 7);
        let found = index
            .find_or_create(b"example", || panic!("create called for an existing label"))
            .unwrap();
        assert_eq!(found, NodeId(7));
        assert_eq!(index.len(), 1);
    }

    fn failed_creation_leaves_index_unchanged<I: ChildIndex>() {
        let mut index = I::default();
        insert(&mut index, b"a", 1);
        let result = index.find_or_create(b"b", || Err(Error::OutOfMemory));
        assert_eq!(result, Err(Error::OutOfMemory));
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(b"b"), None);
        assert_eq!(index.lookup(b"a"), Some(NodeId(1)));
    }

    fn survives_growth<I: ChildIndex>() {
        let mut index = I::default();
        let labels: Vec<String> = (0..20).map(|i| format!("label{}", i)).collect();
        for (i, text) in labels.iter().enumerate() {
            insert(&mut index, text.as_bytes(), i);
            assert!(index.len() <= index.capacity());
        }
        assert_eq!(index.len(), 20);
        for (i, text) in labels.iter().enumerate() {
            assert_eq!(index.lookup(text.as_bytes()), Some(NodeId(i)), "{}", text);
        }
        let mut children: Vec<NodeId> = index.children().collect();
        children.sort();
        assert_eq!(children, (0..20).map(NodeId).collect::<Vec<_>>());
    }

    fn agrees_with_a_hash_map<I: ChildIndex>() {
        let mut rng = StdRng::seed_from_u64(0x646e_7472_6565);
        let mut index = I::default();
        let mut model: HashMap<Vec<u8>, NodeId> = HashMap::new();
        for id in 0..2000 {
            let len = rng.gen_range(0..4);
            let text: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'f')).collect();
            let expected = *model.entry(text.clone()).or_insert(NodeId(id));
            assert_eq!(insert(&mut index, &text, id), expected);
        }
        assert_eq!(index.len(), model.len());
        for (text, id) in &model {
            assert_eq!(index.lookup(text), Some(*id));
        }
        assert_eq!(index.lookup(b"zzzz"), None);
    }

    macro_rules! strategy_tests {
        ($module:ident, $index:ty) => {
            mod $module {
                use super::*;

                #[test]
                fn finds_what_it_stores() {
                    super::finds_what_it_stores::<$index>();
                }

                #[test]
                fn does_not_recreate_existing_children() {
                    super::does_not_recreate_existing_children::<$index>();
                }

                #[test]
                fn failed_creation_leaves_index_unchanged() {
                    super::failed_creation_leaves_index_unchanged::<$index>();
                }

                #[test]
                fn survives_growth() {
                    super::survives_growth::<$index>();
                }

                #[test]
                fn agrees_with_a_hash_map() {
                    super::agrees_with_a_hash_map::<$index>();
                }
            }
        };
    }

    strategy_tests!(hash_index, HashIndex);
    strategy_tests!(sorted_index, SortedIndex);

    #[test]
    fn grown_capacity_doubles_within_32_bits() {
        assert_eq!(grown_capacity(0, 8), Ok(8));
        assert_eq!(grown_capacity(8, 8), Ok(16));
        assert_eq!(grown_capacity(1 << 30, 1), Ok(1 << 31));
        assert_eq!(grown_capacity(1 << 31, 1), Err(Error::IndexOverflow));
    }
}
