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

//! The [`Tree`] structure, mapping domains to caller-supplied data.

use std::fmt;
use std::mem;

use log::trace;

use crate::index::{ChildIndex, HashIndex, SortedIndex};
use crate::intern::Interner;
use crate::label::{Label, LabelIter, MAX_LABEL_LEN, ROOT_SENTINEL};
use crate::Error;

mod iter;
pub use iter::Iter;

/// A handle to a node of a [`Tree`].
///
/// `NodeId`s are only meaningful for the tree that produced them.
/// Since nodes are never removed, a `NodeId` stays valid for the
/// lifetime of its tree. Ids must not be carried over to another tree,
/// including a newer generation of a [`SharedTree`](crate::SharedTree);
/// node accessors panic on ids that are out of range.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(crate) usize);

/// A [`Tree`] whose nodes index their children with a [`SortedIndex`].
pub type SortedTree<T> = Tree<T, SortedIndex>;

/// A tree of domains, each of which may carry data of type `T`.
///
/// The tree mirrors the domain namespace: the root node stands for the
/// root (written `"#"`), its children for top-level domains, and so on.
/// Nodes are created on demand, one per label, when a domain is
/// inserted. Nodes created only as path segments toward a deeper
/// domain carry no data.
///
/// Nodes live in an arena owned by the tree and refer to one another
/// through [`NodeId`]s. Each node's children are found through a
/// [`ChildIndex`] of type `I`. Labels are interned in a pool owned by
/// the tree, so dropping the tree releases everything at once.
///
/// The tree is meant to be built once, during configuration, and then
/// only read. See [`SharedTree`](crate::SharedTree) for replacing a
/// tree that concurrent readers are using.
///
/// ```
/// use dntree::Tree;
///
/// let mut tree = Tree::new();
/// tree.set("example.com", 1).unwrap();
/// tree.set("mail.example.com", 2).unwrap();
///
/// assert_eq!(tree.get("example.com"), Some(&1));
/// assert_eq!(tree.get("mail.example.com"), Some(&2));
/// assert_eq!(tree.get("www.example.com"), None);
/// assert_eq!(tree.get("com"), None);
/// ```
pub struct Tree<T, I = HashIndex> {
    nodes: Vec<Node<T, I>>,
    interner: Interner,
}

/// A node in the arena of a [`Tree`].
#[derive(Debug)]
struct Node<T, I> {
    label: Option<Label>,
    parent: Option<NodeId>,
    data: Option<T>,
    children: I,
}

impl<T, I: ChildIndex> Node<T, I> {
    fn new(label: Option<Label>, parent: Option<NodeId>) -> Self {
        Self {
            label,
            parent,
            data: None,
            children: I::default(),
        }
    }
}

impl<T> Tree<T> {
    /// Creates a new tree holding only a root node with no data. Its
    /// nodes use the default [`HashIndex`] strategy; use
    /// [`Tree::default`] to pick the strategy through the type.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> SortedTree<T> {
    /// Creates a new tree whose nodes use the [`SortedIndex`]
    /// strategy.
    pub fn new_sorted() -> Self {
        Self::default()
    }
}

impl<T, I: ChildIndex> Tree<T, I> {
    /// The root node of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Returns the root node. This is always [`Tree::ROOT`].
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    ////////////////////////////////////////////////////////////////////
    // BUILDING                                                       //
    ////////////////////////////////////////////////////////////////////

    /// Returns the node for `domain`, creating it and any missing
    /// nodes between it and the root. The domain `"#"` yields the root.
    ///
    /// A domain with an over-long label is rejected before any node is
    /// created. If allocation fails partway, nodes created before the
    /// failure remain in the tree as path nodes without data; the tree
    /// stays consistent, but `domain` itself was not inserted.
    pub fn insert_or_create<D>(&mut self, domain: &D) -> Result<NodeId, Error>
    where
        D: AsRef<[u8]> + ?Sized,
    {
        check_labels(domain)?;
        let mut current = Self::ROOT;
        for label in LabelIter::new(domain) {
            current = self.find_or_create_child(current, label?)?;
        }
        Ok(current)
    }

    /// Sets the data for `domain`, creating its node if needed. Returns
    /// the data that was previously set for `domain`, if any.
    pub fn set<D>(&mut self, domain: &D, value: T) -> Result<Option<T>, Error>
    where
        D: AsRef<[u8]> + ?Sized,
    {
        let node = self.insert_or_create(domain)?;
        Ok(self.data_slot_mut(node).replace(value))
    }

    /// Returns the data slot of `node` for in-place modification, such
    /// as merging new configuration into existing data.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn data_slot_mut(&mut self, node: NodeId) -> &mut Option<T> {
        &mut self.nodes[node.0].data
    }

    fn find_or_create_child(&mut self, parent: NodeId, label: &[u8]) -> Result<NodeId, Error> {
        let Self { nodes, interner } = self;

        // The index is taken out of the arena while it is searched, so
        // that the arena can grow if a child must be created.
        let mut children = mem::take(&mut nodes[parent.0].children);
        let result = children.find_or_create(label, || {
            let label = interner.intern(label)?;
            nodes.try_reserve(1)?;
            let child = NodeId(nodes.len());
            trace!("Creating node {} with label {}.", child.0, label);
            nodes.push(Node::new(Some(label.clone()), Some(parent)));
            Ok((label, child))
        });
        nodes[parent.0].children = children;
        result
    }

    ////////////////////////////////////////////////////////////////////
    // QUERYING                                                       //
    ////////////////////////////////////////////////////////////////////

    /// Returns the data set for exactly `domain`.
    ///
    /// Data set for ancestors of `domain` is not considered; see
    /// [`Tree::longest_match`] for that. A domain containing an
    /// over-long label cannot be in the tree, so it yields [`None`]
    /// like any other absent domain; use [`Tree::find`] to tell the two
    /// apart.
    pub fn get<D>(&self, domain: &D) -> Option<&T>
    where
        D: AsRef<[u8]> + ?Sized,
    {
        self.find(domain).ok().flatten().and_then(|node| self.data(node))
    }

    /// The mutable variant of [`Tree::get`].
    pub fn get_mut<D>(&mut self, domain: &D) -> Option<&mut T>
    where
        D: AsRef<[u8]> + ?Sized,
    {
        let node = self.find(domain).ok().flatten()?;
        self.nodes[node.0].data.as_mut()
    }

    /// Finds the node for `domain` without creating anything. Returns
    /// `Ok(None)` if some label along the path has no node, and
    /// [`Error::LabelTooLong`] if `domain` has an over-long label.
    pub fn find<D>(&self, domain: &D) -> Result<Option<NodeId>, Error>
    where
        D: AsRef<[u8]> + ?Sized,
    {
        check_labels(domain)?;
        let mut current = Self::ROOT;
        for label in LabelIter::new(domain) {
            match self.walk(current, label?)? {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Descends one level from `node` to its child labeled `label`.
    /// Returns `Ok(None)` if there is no such child.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn walk(&self, node: NodeId, label: &[u8]) -> Result<Option<NodeId>, Error> {
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        }
        Ok(self.nodes[node.0].children.lookup(label))
    }

    /// Finds the deepest node along the path to `domain` that carries
    /// data, i.e. the data of `domain` itself or else of its nearest
    /// configured ancestor. Data at the root acts as a catch-all.
    ///
    /// ```
    /// use dntree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.set("example.com", "example").unwrap();
    /// let (_, data) = tree.longest_match("www.example.com").unwrap();
    /// assert_eq!(*data, "example");
    /// assert!(tree.longest_match("example.org").is_none());
    /// ```
    pub fn longest_match<D>(&self, domain: &D) -> Option<(NodeId, &T)>
    where
        D: AsRef<[u8]> + ?Sized,
    {
        let mut current = Self::ROOT;
        let mut best = self.data(current).map(|data| (current, data));
        for label in LabelIter::new(domain) {
            // An over-long label has no node, so the search ends there
            // just as it does for an absent label.
            let child = label
                .ok()
                .and_then(|label| self.nodes[current.0].children.lookup(label));
            match child {
                Some(child) => current = child,
                None => break,
            }
            if let Some(data) = self.data(current) {
                best = Some((current, data));
            }
        }
        best
    }

    ////////////////////////////////////////////////////////////////////
    // NODE ACCESS                                                    //
    ////////////////////////////////////////////////////////////////////

    /// Returns the data of `node`, if it has any.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn data(&self, node: NodeId) -> Option<&T> {
        self.nodes[node.0].data.as_ref()
    }

    /// Returns the label of `node`. Only the root has no label.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn label(&self, node: NodeId) -> Option<&Label> {
        self.nodes[node.0].label.as_ref()
    }

    /// Returns the parent of `node`. Only the root has no parent.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Returns an iterator over the children of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn children(&self, node: NodeId) -> I::Children<'_> {
        self.nodes[node.0].children.children()
    }

    /// Reconstructs the domain of `node`, the inverse of
    /// [`Tree::insert_or_create`]. The root yields `"#"`. Labels are
    /// escaped as in their [`Display`](fmt::Display) form, so dots,
    /// backslashes, and octets outside printable ASCII stay distinct.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range for this tree, as an id taken
    /// from a larger tree may be.
    pub fn domain(&self, node: NodeId) -> String {
        if self.label(node).is_none() {
            return ROOT_SENTINEL.to_owned();
        }
        let mut labels = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(label) = self.label(id) {
                labels.push(label.to_string());
            }
            current = self.parent(id);
        }
        labels.join(".")
    }

    /// Returns the number of nodes in the tree, including the root and
    /// path nodes without data.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of distinct labels interned by the tree.
    pub fn interned_labels(&self) -> usize {
        self.interner.len()
    }

    /// Returns an iterator over the nodes that carry data, with their
    /// data, in depth-first order starting at the root.
    pub fn iter(&self) -> Iter<'_, T, I> {
        Iter::new(self)
    }
}

/// Fails if any label of `domain` is over-long, regardless of which
/// nodes exist.
fn check_labels<D: AsRef<[u8]> + ?Sized>(domain: &D) -> Result<(), Error> {
    LabelIter::new(domain).try_for_each(|label| label.map(|_| ()))
}

/// Creates a new tree holding only a root node with no data.
impl<T, I: ChildIndex> Default for Tree<T, I> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new(None, None)],
            interner: Interner::new(),
        }
    }
}

impl<T: fmt::Debug, I: ChildIndex> fmt::Debug for Tree<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(node, data)| (self.domain(node), data)))
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
