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

//! Implements building the set tree from the configuration.

use log::{debug, error};

use dntree::notify::SetName;
use dntree::Tree;

use crate::config::{ConfigSetName, NftsetConfig};
use crate::domain::Domain;

/// The tree mapping each configured domain to its sets.
pub type SetTree = Tree<Vec<SetName>>;

/// Builds the set tree for the configured `nftsets`. A domain that
/// fails to be added is reported and skipped; the rest of the
/// configuration still takes effect.
pub fn load(nftsets: &[NftsetConfig]) -> SetTree {
    let mut tree = SetTree::new();
    let mut domains_failed = 0;

    for nftset in nftsets {
        for domain in &nftset.domains {
            if let Err(e) = add(&mut tree, &domain.0, &nftset.sets) {
                error!("Failed to configure sets for {}: {}", domain.0, e);
                domains_failed += 1;
            }
        }
    }

    if domains_failed == 1 {
        error!("1 domain failed to load.");
    } else if domains_failed > 1 {
        error!("{} domains failed to load.", domains_failed);
    }
    debug!(
        "Set tree built with {} nodes and {} distinct labels.",
        tree.node_count(),
        tree.interned_labels(),
    );
    tree
}

/// Adds `sets` to the sets configured for `domain`, skipping any that
/// are already configured for it.
fn add(tree: &mut SetTree, domain: &Domain, sets: &[ConfigSetName]) -> Result<(), dntree::Error> {
    let node = tree.insert_or_create(domain)?;
    let configured = tree.data_slot_mut(node).get_or_insert_with(Vec::new);
    for set in sets {
        if !configured.contains(&set.0) {
            configured.push(set.0.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDomain;

    fn nftset(domains: &[&str], sets: &[&str]) -> NftsetConfig {
        NftsetConfig {
            domains: domains
                .iter()
                .map(|d| ConfigDomain(d.parse().unwrap()))
                .collect(),
            sets: sets
                .iter()
                .map(|s| ConfigSetName(s.parse().unwrap()))
                .collect(),
        }
    }

    fn set_names(tree: &SetTree, domain: &str) -> Vec<String> {
        tree.get(domain)
            .map(|sets| sets.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn load_merges_sets_per_domain() {
        let tree = load(&[
            nftset(&["example.com", "example.org"], &["ipv4 inet fw a"]),
            nftset(&["example.com"], &["ipv4 inet fw a", "ipv6 inet fw b"]),
            nftset(&["#"], &["ipv4 inet fw all"]),
        ]);
        assert_eq!(set_names(&tree, "example.com"), ["ipv4 inet fw a", "ipv6 inet fw b"]);
        assert_eq!(set_names(&tree, "example.org"), ["ipv4 inet fw a"]);
        assert_eq!(set_names(&tree, "#"), ["ipv4 inet fw all"]);
        assert!(set_names(&tree, "com").is_empty());
    }

    #[test]
    fn load_of_nothing_is_an_empty_tree() {
        let tree = load(&[]);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.iter().count(), 0);
    }
}
