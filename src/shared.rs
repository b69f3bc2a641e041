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

//! The [`SharedTree`] structure, for replacing a tree while it is
//! being read.

use std::sync::{Arc, PoisonError, RwLock};

use crate::index::{ChildIndex, HashIndex};
use crate::tree::Tree;

/// A slot holding the current generation of a [`Tree`].
///
/// A [`Tree`] is built once and then only read, so reloading a
/// configuration means building a fresh tree (with its own label pool)
/// and swapping it in with [`SharedTree::replace`]. Readers obtain the
/// current generation with [`SharedTree::load`] and keep using it for
/// as long as they hold the returned [`Arc`], even if a newer
/// generation is swapped in meanwhile. A generation is dropped when its
/// last reader lets go of it.
pub struct SharedTree<T, I = HashIndex> {
    current: RwLock<Arc<Tree<T, I>>>,
}

impl<T, I: ChildIndex> SharedTree<T, I> {
    /// Creates a new `SharedTree` whose first generation is `tree`.
    pub fn new(tree: Tree<T, I>) -> Self {
        Self {
            current: RwLock::new(Arc::new(tree)),
        }
    }

    /// Returns the current generation.
    pub fn load(&self) -> Arc<Tree<T, I>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes `tree` the current generation and returns the previous
    /// one. Readers that already loaded the previous generation are
    /// unaffected.
    pub fn replace(&self, tree: Tree<T, I>) -> Arc<Tree<T, I>> {
        let tree = Arc::new(tree);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, tree)
    }
}

impl<T, I: ChildIndex> Default for SharedTree<T, I> {
    fn default() -> Self {
        Self::new(Tree::default())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
