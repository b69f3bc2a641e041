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

//! Implements the configuration file.

use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use paste::paste;
use serde::{de, Deserialize};

use dntree::notify::SetName;

use crate::args::SourceArgs;
use crate::domain::Domain;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the configuration from the file given by `path`.
///
/// The `reloading` parameter only controls how the configuration is
/// summarized in the log.
pub fn load_from_path(path: impl AsRef<Path>, reloading: bool) -> Result<Config> {
    let raw_config =
        fs::read_to_string(path.as_ref()).context("failed to read the configuration file")?;
    let config: Config =
        toml::from_str(&raw_config).context("failed to parse the configuration file")?;
    log_config_summary(&config, reloading);
    Ok(config)
}

/// Loads the configuration from the parsed command line arguments
/// given by `args`.
pub fn load_from_args(args: &SourceArgs, reloading: bool) -> Config {
    let config = Config {
        nftset: args
            .nftset
            .iter()
            .map(|description| NftsetConfig {
                domains: description
                    .domains
                    .iter()
                    .cloned()
                    .map(ConfigDomain)
                    .collect(),
                sets: description.sets.iter().cloned().map(ConfigSetName).collect(),
            })
            .collect(),
    };
    log_config_summary(&config, reloading);
    config
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config, reloading: bool) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }

    let mut message = if reloading {
        String::from("Configuration reloaded:\nSets: ")
    } else {
        String::from("Configuration loaded:\nSets: ")
    };
    if config.nftset.is_empty() {
        message.push_str("none configured");
    } else {
        for nftset in &config.nftset {
            let domains: Vec<String> = nftset.domains.iter().map(|d| d.0.to_string()).collect();
            let sets: Vec<String> = nftset.sets.iter().map(|s| s.0.to_string()).collect();
            write!(message, "\n  {} -> {}", domains.join(", "), sets.join(", ")).unwrap();
        }
    }
    debug!("{}", message);
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE STRUCTURE                                       //
////////////////////////////////////////////////////////////////////////

/// The complete configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub nftset: Vec<NftsetConfig>,
}

/// The sets configured for a group of domains. Every domain in the
/// group, and every subdomain of it that is not configured on its own,
/// has its addresses added to every set.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NftsetConfig {
    pub domains: Vec<ConfigDomain>,
    pub sets: Vec<ConfigSetName>,
}

////////////////////////////////////////////////////////////////////////
// WRAPPERS FOR SERDE                                                 //
////////////////////////////////////////////////////////////////////////

/// Generates a deserializable `ConfigX` structure wrapping an `X` type,
/// using its [`FromStr`](std::str::FromStr) implementation.
macro_rules! make_serde_wrapper {
    ($wrapper:ident, $over:ty, $description:literal) => {
        /// A macro-generated deserializable wrapper.
        #[derive(Clone, Debug)]
        pub struct $wrapper(pub $over);

        impl<'de> Deserialize<'de> for $wrapper {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_str(paste! { [<$wrapper Visitor>] })
            }
        }

        paste! {
            /// A macro-generated [`Visitor`](de::Visitor).
            #[derive(Debug)]
            struct [<$wrapper Visitor>];
        }

        impl<'de> de::Visitor<'de> for paste! { [<$wrapper Visitor>] } {
            type Value = $wrapper;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str($description)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .parse()
                    .map($wrapper)
                    .map_err(|e| E::custom(format!("invalid {}: {}", $description, e)))
            }
        }
    };
}

make_serde_wrapper!(ConfigDomain, Domain, "domain");
make_serde_wrapper!(ConfigSetName, SetName, "set name");
