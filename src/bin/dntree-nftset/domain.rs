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

//! Implements the [`Domain`] type, a validated, normalized domain from
//! the configuration or from a resolver.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

use dntree::{LabelIter, ROOT_SENTINEL};

/// A domain in the form used as a key in the set tree.
///
/// Parsing a `Domain`
///
/// * converts it to ASCII lowercase, since DNS comparisons are
///   case-insensitive but the tree's are not;
/// * strips one trailing period, so that absolute names (as resolvers
///   write them) match their relative form; and
/// * maps `.` and `#` to the root.
///
/// Labels must be nonempty and no longer than 63 octets.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Domain(String);

impl Domain {
    /// Returns the root domain, which matches every domain.
    pub fn root() -> Self {
        Self(ROOT_SENTINEL.to_owned())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ROOT_SENTINEL || s == "." {
            return Ok(Self::root());
        }
        let mut domain = s.to_ascii_lowercase();
        if domain.ends_with('.') {
            domain.pop();
        }
        if domain.is_empty() {
            return Err(anyhow!("the domain is empty"));
        }
        for label in LabelIter::new(&domain) {
            if label?.is_empty() {
                return Err(anyhow!("the domain has an empty label"));
            }
        }
        Ok(Self(domain))
    }
}

impl AsRef<[u8]> for Domain {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> String {
        s.parse::<Domain>().unwrap().to_string()
    }

    #[test]
    fn domains_are_normalized() {
        assert_eq!(parse("Mail.Example.COM"), "mail.example.com");
        assert_eq!(parse("example.com."), "example.com");
        assert_eq!(parse("."), "#");
        assert_eq!(parse("#"), "#");
        assert_eq!("#".parse::<Domain>().unwrap(), Domain::root());
    }

    #[test]
    fn invalid_domains_are_rejected() {
        assert!("".parse::<Domain>().is_err());
        assert!("a..b".parse::<Domain>().is_err());
        assert!(".a".parse::<Domain>().is_err());
        assert!("a.b..".parse::<Domain>().is_err());
        let too_long = format!("{}.com", "x".repeat(64));
        assert!(too_long.parse::<Domain>().is_err());
    }
}
