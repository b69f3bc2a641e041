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

//! A tree that maps domains to data.
//!
//! The central type of this crate is the [`Tree`], which associates
//! data of any type with domains and answers, at query time, whether a
//! domain (or, through [`Tree::longest_match`], any of its ancestors)
//! carries configured data. A DNS forwarder might, for instance, build
//! a tree of per-domain policies while loading its configuration and
//! consult it for every query it resolves.
//!
//! Domains are split into labels by a [`LabelIter`], which produces
//! them from the rightmost (nearest the root) to the leftmost; the tree
//! is descended in that order. The special domain `"#"` denotes the
//! root itself. Labels are interned per tree, and each node indexes its
//! children with a [`ChildIndex`]: either a [`HashIndex`] (the default)
//! or a [`SortedIndex`].
//!
//! Trees are built once and then read. To reload a configuration while
//! readers are active, build a new tree and swap it into a
//! [`SharedTree`].
//!
//! The [`notify`] module builds on the tree to add resolved addresses
//! to packet-filter sets configured per domain.

mod error;
pub mod index;
pub mod intern;
pub mod label;
pub mod notify;
mod shared;
mod tree;

pub use error::Error;
pub use index::{ChildIndex, HashIndex, SortedIndex};
pub use label::{Label, LabelIter, MAX_LABEL_LEN, ROOT_SENTINEL};
pub use shared::SharedTree;
pub use tree::{Iter, NodeId, SortedTree, Tree};
