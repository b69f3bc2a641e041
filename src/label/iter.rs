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

//! Implementation of the [`LabelIter`] type.

use std::iter::FusedIterator;

use super::{MAX_LABEL_LEN, ROOT_SENTINEL};
use crate::Error;

/// An iterator over the labels of a domain, from the rightmost label
/// (nearest the root) to the leftmost.
///
/// For `"a.b.c"`, the labels produced are `"c"`, `"b"`, and `"a"`. This
/// is the order in which the tree is descended, so insertion and lookup
/// always agree on the path for a domain.
///
/// The empty domain and the root sentinel `"#"` produce no labels.
/// Adjacent periods, and leading or trailing periods, produce
/// zero-length labels: `"a..b"` yields `"b"`, `""`, `"a"`.
///
/// A label longer than [`MAX_LABEL_LEN`] octets produces
/// [`Error::LabelTooLong`], after which the iterator is exhausted.
///
/// ```
/// use dntree::LabelIter;
///
/// let labels: Result<Vec<_>, _> = LabelIter::new("mail.example.com").collect();
/// assert_eq!(labels.unwrap(), [&b"com"[..], &b"example"[..], &b"mail"[..]]);
/// ```
#[derive(Clone, Debug)]
pub struct LabelIter<'a> {
    domain: &'a [u8],

    /// The end of the unconsumed prefix of `domain`, or `None` once
    /// every label has been produced.
    end: Option<usize>,
}

impl<'a> LabelIter<'a> {
    /// Creates a new `LabelIter` over `domain`.
    pub fn new<D: AsRef<[u8]> + ?Sized>(domain: &'a D) -> Self {
        let domain = domain.as_ref();
        Self {
            domain,
            end: Self::initial_end(domain),
        }
    }

    /// Restarts iteration over a (possibly different) domain.
    pub fn reset<D: AsRef<[u8]> + ?Sized>(&mut self, domain: &'a D) {
        *self = Self::new(domain);
    }

    /// Returns whether more labels (or an error) remain to be produced.
    pub fn has_next(&self) -> bool {
        self.end.is_some()
    }

    fn initial_end(domain: &[u8]) -> Option<usize> {
        if domain.is_empty() || domain == ROOT_SENTINEL.as_bytes() {
            None
        } else {
            Some(domain.len())
        }
    }
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = Result<&'a [u8], Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.end?;
        let unconsumed = &self.domain[..end];
        let (label, next_end) = match unconsumed.iter().rposition(|&b| b == b'.') {
            Some(dot) => (&unconsumed[dot + 1..], Some(dot)),
            None => (unconsumed, None),
        };
        if label.len() > MAX_LABEL_LEN {
            self.end = None;
            Some(Err(Error::LabelTooLong))
        } else {
            self.end = next_end;
            Some(Ok(label))
        }
    }
}

impl FusedIterator for LabelIter<'_> {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(domain: &str) -> Result<Vec<String>, Error> {
        LabelIter::new(domain)
            .map(|label| label.map(|octets| String::from_utf8_lossy(octets).into_owned()))
            .collect()
    }

    #[test]
    fn labels_come_from_the_right() {
        assert_eq!(labels("a.b.c").unwrap(), vec!["c", "b", "a"]);
        assert_eq!(labels("com").unwrap(), vec!["com"]);
    }

    #[test]
    fn root_forms_produce_no_labels() {
        assert!(labels("").unwrap().is_empty());
        assert!(labels("#").unwrap().is_empty());
        assert!(!LabelIter::new("#").has_next());
    }

    #[test]
    fn sentinel_is_only_special_on_its_own() {
        assert_eq!(labels("#.com").unwrap(), vec!["com", "#"]);
    }

    #[test]
    fn empty_labels_are_produced() {
        assert_eq!(labels("a..b").unwrap(), vec!["b", "", "a"]);
        assert_eq!(labels("a.").unwrap(), vec!["", "a"]);
        assert_eq!(labels(".a").unwrap(), vec!["a", ""]);
        assert_eq!(labels(".").unwrap(), vec!["", ""]);
    }

    #[test]
    fn label_length_limit_is_enforced() {
        let ok = "x".repeat(MAX_LABEL_LEN);
        let too_long = "x".repeat(MAX_LABEL_LEN + 1);
        assert_eq!(labels(&ok).unwrap(), vec![ok.clone()]);
        assert_eq!(labels(&too_long), Err(Error::LabelTooLong));

        // The error ends iteration, even if more labels follow.
        let domain = format!("a.{}.com", too_long);
        let mut iter = LabelIter::new(&domain);
        assert_eq!(iter.next(), Some(Ok(&b"com"[..])));
        assert_eq!(iter.next(), Some(Err(Error::LabelTooLong)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn reset_restarts_iteration() {
        let first = String::from("x.y");
        let second = String::from("z");
        let mut iter = LabelIter::new(&first);
        assert_eq!(iter.next(), Some(Ok(&b"y"[..])));
        iter.reset(&first);
        assert_eq!(iter.next(), Some(Ok(&b"y"[..])));
        assert_eq!(iter.next(), Some(Ok(&b"x"[..])));
        assert_eq!(iter.next(), None);
        iter.reset(&second);
        assert_eq!(iter.next(), Some(Ok(&b"z"[..])));
        assert!(!iter.has_next());
    }
}
