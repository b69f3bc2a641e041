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

//! Implementation of the [`Iter`] type.

use std::iter::FusedIterator;

use super::{NodeId, Tree};
use crate::index::ChildIndex;

/// An iterator over the nodes of a [`Tree`] that carry data, in
/// depth-first order starting at the root.
pub struct Iter<'a, T, I>
where
    I: ChildIndex + 'a,
{
    tree: &'a Tree<T, I>,
    state: IterState<'a, I>,
}

/// The internal state of an [`Iter`].
enum IterState<'a, I>
where
    I: ChildIndex + 'a,
{
    /// The next action is to return the data at the current node.
    Node {
        node: NodeId,
        stack: Vec<I::Children<'a>>,
    },

    /// The next action is to begin processing the next unprocessed
    /// child of the current node.
    Children {
        children: I::Children<'a>,
        stack: Vec<I::Children<'a>>,
    },

    /// Iteration is complete.
    Finished,
}

impl<'a, T, I> Iter<'a, T, I>
where
    I: ChildIndex + 'a,
{
    /// Creates a new `Iter` that will iterate over the provided tree.
    pub(super) fn new(tree: &'a Tree<T, I>) -> Self {
        Self {
            tree,
            state: IterState::Node {
                node: Tree::<T, I>::ROOT,
                stack: Vec::new(),
            },
        }
    }

    /// Acts on the current state of the iterator. Returns the next
    /// value to return from [`Iterator::next`], or `None` if the state
    /// transition did not produce a new value. In the latter case, this
    /// method should be called repeatedly until it produces a value.
    fn execute_state_machine(&mut self) -> Option<Option<(NodeId, &'a T)>> {
        let previous_state = std::mem::replace(&mut self.state, IterState::Finished);
        match previous_state {
            IterState::Node { node, stack } => {
                self.state = IterState::Children {
                    children: self.tree.children(node),
                    stack,
                };
                self.tree.data(node).map(|data| Some((node, data)))
            }
            IterState::Children {
                mut children,
                mut stack,
            } => {
                if let Some(next_child) = children.next() {
                    stack.push(children);
                    self.state = IterState::Node {
                        node: next_child,
                        stack,
                    };
                    None
                } else if let Some(parent) = stack.pop() {
                    self.state = IterState::Children {
                        children: parent,
                        stack,
                    };
                    None
                } else {
                    Some(None)
                }
            }
            IterState::Finished => Some(None),
        }
    }
}

impl<'a, T, I> Iterator for Iter<'a, T, I>
where
    I: ChildIndex + 'a,
{
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.execute_state_machine() {
                return result;
            }
        }
    }
}

impl<'a, T, I> FusedIterator for Iter<'a, T, I> where I: ChildIndex + 'a {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::index::{HashIndex, SortedIndex};

    use super::*;

    fn collect<I: ChildIndex>(tree: &Tree<u32, I>) -> BTreeMap<String, u32> {
        tree.iter()
            .map(|(node, data)| (tree.domain(node), *data))
            .collect()
    }

    fn visits_every_configured_node<I: ChildIndex>() {
        let mut tree = Tree::<u32, I>::default();
        assert_eq!(tree.iter().next(), None);

        let domains = [
            ("#", 0),
            ("com", 1),
            ("example.com", 2),
            ("a.b.c.example.com", 3),
            ("example.org", 4),
        ];
        for (domain, value) in domains {
            tree.set(domain, value).unwrap();
        }
        tree.insert_or_create("path.only.net").unwrap();

        let expected: BTreeMap<String, u32> = domains
            .iter()
            .map(|(domain, value)| (domain.to_string(), *value))
            .collect();
        assert_eq!(collect(&tree), expected);
        assert_eq!(tree.iter().count(), domains.len());
    }

    fn parents_come_before_children<I: ChildIndex>() {
        let mut tree = Tree::<u32, I>::default();
        tree.set("x.y.z", 3).unwrap();
        tree.set("y.z", 2).unwrap();
        tree.set("z", 1).unwrap();
        let order: Vec<u32> = tree.iter().map(|(_, data)| *data).collect();
        assert_eq!(order, [1, 2, 3]);
    }

    #[test]
    fn hash_index_visits_every_configured_node() {
        visits_every_configured_node::<HashIndex>();
    }

    #[test]
    fn sorted_index_visits_every_configured_node() {
        visits_every_configured_node::<SortedIndex>();
    }

    #[test]
    fn hash_index_parents_come_before_children() {
        parents_come_before_children::<HashIndex>();
    }

    #[test]
    fn sorted_index_parents_come_before_children() {
        parents_come_before_children::<SortedIndex>();
    }
}
