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

//! Announcing resolved addresses to named packet-filter sets.
//!
//! A DNS forwarder that resolves a domain configured in a
//! [`Tree`] of set names can add the addresses it resolved to those
//! sets, so that firewall rules can match traffic by domain. This
//! module provides the typed [`SetName`], the [`SetNotifier`] sink
//! interface, the [`NftScript`] sink that writes `nft` commands, and
//! [`announce`], which ties them to a tree.

use std::fmt;
use std::io::{self, Write};
use std::net::IpAddr;
use std::str::FromStr;

use crate::index::ChildIndex;
use crate::tree::Tree;

////////////////////////////////////////////////////////////////////////
// SET NAMES                                                          //
////////////////////////////////////////////////////////////////////////

/// The address family of a set.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    /// Returns the family of `addr`.
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::Ipv4,
            IpAddr::V6(_) => Self::Ipv6,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4 ",
            Self::Ipv6 => "ipv6 ",
        }
    }
}

/// The name of a set, qualified with the address family it holds.
///
/// Set names are written with a family prefix followed by the set's
/// name as `nft` expects it (its family, table, and set), for instance
/// `ipv4 inet filter allowed4`. Only addresses of the prefixed family
/// are added to the set.
///
/// ```
/// use dntree::notify::{Family, SetName};
///
/// let set: SetName = "ipv6 inet filter allowed6".parse().unwrap();
/// assert_eq!(set.family(), Family::Ipv6);
/// assert_eq!(set.name(), "inet filter allowed6");
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SetName {
    family: Family,
    name: String,
}

impl SetName {
    /// Returns the address family of the set.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Returns the name of the set, without the family prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether `addr` belongs in this set.
    pub fn accepts(&self, addr: &IpAddr) -> bool {
        Family::of(addr) == self.family
    }
}

impl FromStr for SetName {
    type Err = SetNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, rest) = [Family::Ipv4, Family::Ipv6]
            .into_iter()
            .find_map(|family| s.strip_prefix(family.prefix()).map(|rest| (family, rest)))
            .ok_or(SetNameError::MissingFamily)?;
        let name = rest.trim();
        if name.is_empty() {
            Err(SetNameError::EmptyName)
        } else {
            Ok(Self {
                family,
                name: name.to_owned(),
            })
        }
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.family.prefix(), self.name)
    }
}

/// An error signaling an invalid [`SetName`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SetNameError {
    /// The name did not start with `ipv4 ` or `ipv6 `.
    MissingFamily,

    /// Nothing followed the family prefix.
    EmptyName,
}

impl fmt::Display for SetNameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::MissingFamily => {
                f.write_str("set name does not start with \"ipv4 \" or \"ipv6 \"")
            }
            Self::EmptyName => f.write_str("set name is empty"),
        }
    }
}

impl std::error::Error for SetNameError {}

////////////////////////////////////////////////////////////////////////
// NOTIFIERS                                                          //
////////////////////////////////////////////////////////////////////////

/// Trait for sinks that add addresses to sets.
pub trait SetNotifier {
    /// The error type of the sink.
    type Error;

    /// Adds `addr` to `set`. The caller has already checked that
    /// `addr` is of the set's family.
    fn notify(&mut self, set: &SetName, addr: IpAddr) -> Result<(), Self::Error>;
}

/// A [`SetNotifier`] that writes one `nft` command per notification,
/// producing a script suitable for `nft -f -`.
#[derive(Debug)]
pub struct NftScript<W> {
    out: W,
}

impl<W: Write> NftScript<W> {
    /// Creates a new `NftScript` writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SetNotifier for NftScript<W> {
    type Error = io::Error;

    fn notify(&mut self, set: &SetName, addr: IpAddr) -> io::Result<()> {
        writeln!(self.out, "add element {} {{ {} }}", set.name(), addr)
    }
}

/// Announces the addresses `addrs`, resolved for `domain`, to the sets
/// configured for `domain` or its nearest configured ancestor in
/// `tree`. Each address goes only to the sets of its family. Returns
/// the number of notifications made.
pub fn announce<T, I, D, A, N>(
    tree: &Tree<T, I>,
    domain: &D,
    addrs: A,
    notifier: &mut N,
) -> Result<usize, N::Error>
where
    T: AsRef<[SetName]>,
    I: ChildIndex,
    D: AsRef<[u8]> + ?Sized,
    A: IntoIterator<Item = IpAddr>,
    N: SetNotifier,
{
    let sets: &[SetName] = match tree.longest_match(domain) {
        Some((_, sets)) => sets.as_ref(),
        None => return Ok(0),
    };
    let mut notifications = 0;
    for addr in addrs {
        for set in sets.iter().filter(|set| set.accepts(&addr)) {
            notifier.notify(set, addr)?;
            notifications += 1;
        }
    }
    Ok(notifications)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        notifications: Vec<(String, IpAddr)>,
    }

    impl SetNotifier for Recorder {
        type Error = Infallible;

        fn notify(&mut self, set: &SetName, addr: IpAddr) -> Result<(), Infallible> {
            self.notifications.push((set.to_string(), addr));
            Ok(())
        }
    }

    fn sets(names: &[&str]) -> Vec<SetName> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    #[test]
    fn set_names_parse() {
        let set: SetName = "ipv4 inet filter allowed".parse().unwrap();
        assert_eq!(set.family(), Family::Ipv4);
        assert_eq!(set.name(), "inet filter allowed");
        assert_eq!(set.to_string(), "ipv4 inet filter allowed");
        assert_eq!("inet filter allowed".parse::<SetName>(), Err(SetNameError::MissingFamily));
        assert_eq!("ipv4 ".parse::<SetName>(), Err(SetNameError::EmptyName));
        assert_eq!("IPV4 x".parse::<SetName>(), Err(SetNameError::MissingFamily));
    }

    #[test]
    fn announce_filters_by_family() {
        let mut tree = Tree::new();
        tree.set(
            "example.com",
            sets(&["ipv4 inet fw allow4", "ipv6 inet fw allow6"]),
        )
        .unwrap();

        let mut recorder = Recorder::default();
        let v4: IpAddr = "192.0.2.1".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();
        let count = announce(&tree, "www.example.com", [v4, v6], &mut recorder).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            recorder.notifications,
            [
                ("ipv4 inet fw allow4".to_owned(), v4),
                ("ipv6 inet fw allow6".to_owned(), v6),
            ],
        );
    }

    #[test]
    fn announce_ignores_unconfigured_domains() {
        let mut tree = Tree::new();
        tree.set("example.com", sets(&["ipv4 inet fw allow4"])).unwrap();
        let mut recorder = Recorder::default();
        let addr: IpAddr = "192.0.2.1".parse().unwrap();
        assert_eq!(announce(&tree, "example.org", [addr], &mut recorder), Ok(0));
        assert!(recorder.notifications.is_empty());
    }

    #[test]
    fn nft_script_writes_commands() {
        let mut tree = Tree::new();
        tree.set("#", sets(&["ipv4 inet fw all4"])).unwrap();
        tree.set("example.com", sets(&["ipv6 inet fw example6"])).unwrap();

        let mut script = NftScript::new(Vec::new());
        let v4: IpAddr = "198.51.100.7".parse().unwrap();
        let v6: IpAddr = "2001:db8::7".parse().unwrap();
        announce(&tree, "example.org", [v4, v6], &mut script).unwrap();
        announce(&tree, "example.com", [v4, v6], &mut script).unwrap();
        assert_eq!(
            String::from_utf8(script.into_inner()).unwrap(),
            "add element inet fw all4 { 198.51.100.7 }\n\
             add element inet fw example6 { 2001:db8::7 }\n",
        );
    }
}
