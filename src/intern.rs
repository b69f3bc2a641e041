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

//! Implementation of the [`Interner`], the per-tree label pool.

use std::collections::HashSet;
use std::sync::Arc;

use crate::label::{Label, MAX_LABEL_LEN};
use crate::Error;

/// A pool of label strings.
///
/// [`Interner::intern`] returns a [`Label`] sharing storage with every
/// other `Label` of equal text produced by the same pool, so a label
/// like `com` that appears under thousands of configured domains is
/// stored once. Entries are never evicted.
///
/// Each [`Tree`](crate::Tree) owns its own `Interner`. Labels handed
/// out by the pool are reference counted, so they stay valid as long as
/// any node (or any caller holding a clone) still refers to them, even
/// after the tree generation that created them is dropped.
#[derive(Debug, Default)]
pub struct Interner {
    pool: HashSet<Arc<[u8]>>,
}

impl Interner {
    /// Creates a new, empty `Interner`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared [`Label`] for `octets`, adding it to the pool
    /// if this is the first time it has been seen.
    ///
    /// Fails with [`Error::LabelTooLong`] if `octets` is not a valid
    /// label and with [`Error::OutOfMemory`] if the pool cannot grow.
    /// On failure, the pool is unchanged.
    pub fn intern(&mut self, octets: &[u8]) -> Result<Label, Error> {
        if octets.len() > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        }
        if let Some(shared) = self.pool.get(octets) {
            return Ok(Label::from_shared(shared.clone()));
        }
        self.pool.try_reserve(1)?;
        let shared: Arc<[u8]> = Arc::from(octets);
        self.pool.insert(shared.clone());
        Ok(Label::from_shared(shared))
    }

    /// Returns the number of distinct labels in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_text_shares_storage() {
        let mut interner = Interner::new();
        let a = interner.intern(b"com").unwrap();
        let b = interner.intern(b"com").unwrap();
        let c = interner.intern(b"org").unwrap();
        assert!(Label::ptr_eq(&a, &b));
        assert!(!Label::ptr_eq(&a, &c));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn labels_outlive_the_pool() {
        let label = {
            let mut interner = Interner::new();
            interner.intern(b"example").unwrap()
        };
        assert_eq!(label.octets(), b"example");
    }

    #[test]
    fn overlong_labels_are_rejected() {
        let mut interner = Interner::new();
        assert_eq!(
            interner.intern(&[b'x'; MAX_LABEL_LEN + 1]),
            Err(Error::LabelTooLong),
        );
        assert!(interner.is_empty());
        assert!(interner.intern(&[b'x'; MAX_LABEL_LEN]).is_ok());
    }
}
