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

//! Implementation of the [`HashIndex`] child-index strategy.

use std::iter::FusedIterator;
use std::mem;
use std::slice;

use log::debug;

use super::{grown_capacity, ChildIndex};
use crate::label::Label;
use crate::tree::NodeId;
use crate::Error;

/// The number of slots allocated for the first child.
pub const INITIAL_CAPACITY: usize = 8;

/// An open-addressing hash table from labels to children.
///
/// Collisions are resolved by linear probing. Before an insertion would
/// make the table more than half full, its storage is doubled and every
/// entry is rehashed, so probe sequences stay short and always reach an
/// empty slot.
///
/// An empty `HashIndex` owns no storage; the first insertion allocates
/// [`INITIAL_CAPACITY`] slots.
#[derive(Debug, Default)]
pub struct HashIndex {
    slots: Box<[Option<Slot>]>,
    len: usize,
}

#[derive(Debug)]
struct Slot {
    label: Label,
    child: NodeId,
}

impl HashIndex {
    /// Returns the index of the slot holding `label` or, if `label` is
    /// absent, of the empty slot where its probe sequence ends. The
    /// table must have allocated storage.
    fn find_slot(&self, label: &[u8]) -> usize {
        let capacity = self.slots.len();
        let mut index = hash(label) as usize % capacity;

        // At least half of the slots are empty, so this terminates.
        loop {
            match self.slots[index] {
                Some(ref slot) if slot.label.octets() != label => {
                    index = (index + 1) % capacity;
                }
                _ => return index,
            }
        }
    }

    /// Doubles the table's storage and rehashes every entry into it. On
    /// failure, the table is left as it was.
    fn grow(&mut self) -> Result<(), Error> {
        let new_capacity = grown_capacity(self.slots.len(), INITIAL_CAPACITY)?;
        let mut new_slots = Vec::new();
        new_slots.try_reserve_exact(new_capacity)?;
        new_slots.resize_with(new_capacity, || None);

        let old_slots = mem::replace(&mut self.slots, new_slots.into_boxed_slice());
        if !old_slots.is_empty() {
            debug!(
                "Growing a child index from {} to {} slots ({} children).",
                old_slots.len(),
                new_capacity,
                self.len,
            );
        }
        for slot in old_slots.into_vec().into_iter().flatten() {
            let index = self.find_slot(slot.label.octets());
            self.slots[index] = Some(slot);
        }
        Ok(())
    }
}

impl ChildIndex for HashIndex {
    type Children<'a> = Children<'a>;

    fn lookup(&self, label: &[u8]) -> Option<NodeId> {
        if self.slots.is_empty() {
            return None;
        }
        self.slots[self.find_slot(label)].as_ref().map(|slot| slot.child)
    }

    fn find_or_create<F>(&mut self, label: &[u8], create: F) -> Result<NodeId, Error>
    where
        F: FnOnce() -> Result<(Label, NodeId), Error>,
    {
        if let Some(child) = self.lookup(label) {
            return Ok(child);
        }
        if (self.len + 1) * 2 > self.slots.len() {
            self.grow()?;
        }

        let index = self.find_slot(label);
        let (label, child) = create()?;
        self.slots[index] = Some(Slot { label, child });
        self.len += 1;
        Ok(child)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn children(&self) -> Self::Children<'_> {
        Children {
            slots: self.slots.iter(),
        }
    }
}

/// An iterator over the children in a [`HashIndex`], in slot order.
pub struct Children<'a> {
    slots: slice::Iter<'a, Option<Slot>>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots.find_map(|slot| slot.as_ref().map(|slot| slot.child))
    }
}

impl FusedIterator for Children<'_> {}

/// Hashes a label with Bob Jenkins's one-at-a-time hash. This mixes
/// every octet in order and has good avalanche behavior for short keys,
/// which is all that's needed here.
fn hash(octets: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &octet in octets {
        hash = hash.wrapping_add(octet as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn insert(index: &mut HashIndex, text: &str, id: usize) {
        let label = Label::from_shared(Arc::from(text.as_bytes()));
        index
            .find_or_create(text.as_bytes(), || Ok((label, NodeId(id))))
            .unwrap();
    }

    #[test]
    fn hash_matches_reference_values() {
        // Reference values for the one-at-a-time hash.
        assert_eq!(hash(b""), 0);
        assert_eq!(hash(b"a"), 0xca2e_9442);
        assert_eq!(
            hash(b"The quick brown fox jumps over the lazy dog"),
            0x519e_91f5,
        );
    }

    #[test]
    fn hash_is_order_sensitive() {
        assert_ne!(hash(b"ab"), hash(b"ba"));
    }

    #[test]
    fn load_factor_stays_at_most_half() {
        let mut index = HashIndex::default();
        for i in 0..100 {
            insert(&mut index, &format!("host{}", i), i);
            assert!(index.len() * 2 <= index.capacity());
        }
    }

    #[test]
    fn capacity_doubles_from_initial() {
        let mut index = HashIndex::default();
        let mut capacities = Vec::new();
        for i in 0..20 {
            insert(&mut index, &format!("n{}", i), i);
            if capacities.last() != Some(&index.capacity()) {
                capacities.push(index.capacity());
            }
        }
        assert_eq!(capacities, [8, 16, 32, 64]);
    }
}
