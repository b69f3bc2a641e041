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

//! Implements command-line argument parsing.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use clap::{ArgGroup, Parser, Subcommand};

use dntree::notify::SetName;

use crate::domain::Domain;

/// Parses the command line arguemnts.
pub fn parse() -> Args {
    Args::parse()
}

/// Adds addresses resolved for configured domains to nftables sets
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read "DOMAIN ADDRESS..." lines from standard input and write nft
    /// commands to standard output
    Run(SourceArgs),

    /// Load the configuration and list the configured domains
    Check(SourceArgs),
}

#[derive(Clone, Debug, Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["config", "nftset"])))]
pub struct SourceArgs {
    /// Set the configuration file to use
    #[arg(long, conflicts_with = "nftset", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Add sets for domains
    #[arg(long, value_name = "/DOMAIN[/DOMAIN...]/SET[,SET...]")]
    pub nftset: Vec<NftsetDescription>,
}

/// A description of domains and their sets provided on the command
/// line with the `--nftset` option, in the form
///
/// * `/example.com/example.org/ipv4 inet filter allow4,ipv6 inet filter allow6`
///
/// An empty domain list (as in `//ipv4 inet filter all4`) or the domain
/// `#` configures the sets for every domain.
#[derive(Clone, Debug)]
pub struct NftsetDescription {
    pub domains: Vec<Domain>,
    pub sets: Vec<SetName>,
}

impl FromStr for NftsetDescription {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| anyhow!("the description must start with '/'"))?;
        let (domains, sets) = rest
            .rsplit_once('/')
            .ok_or_else(|| anyhow!("the description has no set list"))?;

        let domains = if domains.is_empty() {
            vec![Domain::root()]
        } else {
            domains
                .split('/')
                .map(|domain| {
                    domain
                        .parse()
                        .map_err(|e| anyhow!("invalid domain {:?}: {}", domain, e))
                })
                .collect::<Result<_, _>>()?
        };
        let sets = sets
            .split(',')
            .map(|set| {
                set.parse()
                    .map_err(|e| anyhow!("invalid set name {:?}: {}", set, e))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { domains, sets })
    }
}
