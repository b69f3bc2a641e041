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

//! Implements the `run` and `check` commands.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, error, info, warn};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use dntree::notify::{self, NftScript, SetName, SetNotifier};
use dntree::SharedTree;

use crate::args::SourceArgs;
use crate::config::{self, Config};
use crate::domain::Domain;
use crate::sets::{self, SetTree};

/// Runs the daemon.
pub fn run(args: SourceArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));
    exit_on_failure(try_running(args));
}

/// Loads the configuration and lists the configured domains.
pub fn check(args: SourceArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));
    exit_on_failure(try_checking(args));
}

fn exit_on_failure(result: Result<()>) {
    if let Err(e) = result {
        error!("{}", describe_failure("Failed to run:", &e));
        process::exit(1);
    }
    info!("Exiting with success.");
}

/// Formats `e` and its causes as a numbered list under `heading`.
fn describe_failure(heading: &str, e: &anyhow::Error) -> String {
    let mut message = String::from(heading);
    for (i, cause) in e.chain().enumerate() {
        write!(message, "\n[{}] {}", i + 1, cause).unwrap();
    }
    message
}

fn try_running(args: SourceArgs) -> Result<()> {
    info!(
        "dntree-nftset v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    let source = ConfigSource::from(args);
    let config = source.load(false).context("failed to load the configuration")?;
    let shared = Arc::new(SharedTree::new(sets::load(&config.nftset)));
    let signals = Signals::new([SIGHUP, SIGINT, SIGTERM])
        .context("failed to set up signal handling")?;
    {
        let shared = shared.clone();
        thread::Builder::new()
            .name("signals".into())
            .spawn(move || handle_signals(signals, source, &shared))
            .context("failed to start the signal-handling thread")?;
    }

    info!("Set-up is complete; reading resolved addresses.");
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut script = NftScript::new(stdout.lock());
    for line in stdin.lock().lines() {
        let line = line.context("failed to read standard input")?;
        let tree = shared.load();
        process_line(&tree, &line, &mut script).context("failed to write nft commands")?;
        script.flush().context("failed to write nft commands")?;
    }
    Ok(())
}

fn try_checking(args: SourceArgs) -> Result<()> {
    let config = ConfigSource::from(args)
        .load(false)
        .context("failed to load the configuration")?;
    let tree = sets::load(&config.nftset);
    let stdout = io::stdout();
    list_domains(&tree, &mut stdout.lock()).context("failed to write the domain list")
}

/// Writes one `DOMAIN: SET, SET...` line per configured domain.
fn list_domains(tree: &SetTree, out: &mut impl Write) -> io::Result<()> {
    for (node, sets) in tree.iter() {
        let sets: Vec<String> = sets.iter().map(ToString::to_string).collect();
        writeln!(out, "{}: {}", tree.domain(node), sets.join(", "))?;
    }
    Ok(())
}

/// Handles one input line of the form `DOMAIN ADDRESS...`. Malformed
/// domains and addresses are reported and skipped.
fn process_line<N>(tree: &SetTree, line: &str, notifier: &mut N) -> Result<usize, N::Error>
where
    N: SetNotifier,
{
    let mut fields = line.split_whitespace();
    let domain = match fields.next().map(str::parse::<Domain>) {
        Some(Ok(domain)) => domain,
        Some(Err(e)) => {
            warn!("Ignoring input line {:?}: {}", line, e);
            return Ok(0);
        }
        None => return Ok(0),
    };
    let addrs = fields.filter_map(|field| match field.parse::<IpAddr>() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!("Ignoring address {:?} for {}: {}", field, domain, e);
            None
        }
    });
    let notifications = notify::announce(tree, &domain, addrs, notifier)?;
    debug!("Made {} notifications for {}.", notifications, domain);
    Ok(notifications)
}

////////////////////////////////////////////////////////////////////////
// SIGNALS AND RELOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Where the configuration came from, and thus where to reload it from.
enum ConfigSource {
    Args(SourceArgs),
    Path(PathBuf),
}

impl From<SourceArgs> for ConfigSource {
    fn from(args: SourceArgs) -> Self {
        match args.config {
            Some(path) => Self::Path(path),
            None => Self::Args(args),
        }
    }
}

impl ConfigSource {
    fn load(&self, reloading: bool) -> Result<Config> {
        match self {
            Self::Args(args) => {
                info!("Loading the configuration from the command line.");
                Ok(config::load_from_args(args, reloading))
            }
            Self::Path(path) => {
                info!("Loading the configuration from {}.", path.display());
                config::load_from_path(path, reloading)
            }
        }
    }
}

fn handle_signals(
    mut signals: Signals,
    source: ConfigSource,
    shared: &SharedTree<Vec<SetName>>,
) {
    for signal in signals.forever() {
        match signal {
            s @ (SIGINT | SIGTERM) => {
                let name = if s == SIGINT { "SIGINT" } else { "SIGTERM" };
                info!("Received {}; shutting down.", name);
                process::exit(0);
            }
            SIGHUP => {
                info!("Received SIGHUP; reloading the configuration.");
                match source.load(true) {
                    Ok(config) => {
                        shared.replace(sets::load(&config.nftset));
                        info!("Reload complete.");
                    }
                    Err(e) => error!(
                        "{}",
                        describe_failure("Failed to reload the configuration:", &e)
                    ),
                }
            }
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigDomain, ConfigSetName, NftsetConfig};

    fn tree() -> SetTree {
        sets::load(&[NftsetConfig {
            domains: vec![ConfigDomain("example.com".parse().unwrap())],
            sets: vec![
                ConfigSetName("ipv4 inet fw a4".parse().unwrap()),
                ConfigSetName("ipv6 inet fw a6".parse().unwrap()),
            ],
        }])
    }

    fn output(line: &str) -> (usize, String) {
        let mut script = NftScript::new(Vec::new());
        let count = process_line(&tree(), line, &mut script).unwrap();
        (count, String::from_utf8(script.into_inner()).unwrap())
    }

    #[test]
    fn process_line_announces_addresses() {
        assert_eq!(
            output("WWW.Example.com. 192.0.2.1 2001:db8::1"),
            (
                2,
                "add element inet fw a4 { 192.0.2.1 }\n\
                 add element inet fw a6 { 2001:db8::1 }\n"
                    .to_owned(),
            ),
        );
    }

    #[test]
    fn process_line_skips_malformed_input() {
        assert_eq!(output(""), (0, String::new()));
        assert_eq!(output("a..b 192.0.2.1"), (0, String::new()));
        assert_eq!(
            output("example.com bogus 192.0.2.9"),
            (1, "add element inet fw a4 { 192.0.2.9 }\n".to_owned()),
        );
        assert_eq!(output("example.net 192.0.2.1"), (0, String::new()));
    }

    #[test]
    fn list_domains_shows_configured_sets() {
        let tree = sets::load(&[
            NftsetConfig {
                domains: vec![ConfigDomain("Example.com.".parse().unwrap())],
                sets: vec![
                    ConfigSetName("ipv4 inet fw a4".parse().unwrap()),
                    ConfigSetName("ipv6 inet fw a6".parse().unwrap()),
                ],
            },
            NftsetConfig {
                domains: vec![ConfigDomain("#".parse().unwrap())],
                sets: vec![ConfigSetName("ipv4 inet fw all4".parse().unwrap())],
            },
        ]);
        let mut out = Vec::new();
        list_domains(&tree, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#: ipv4 inet fw all4\n\
             example.com: ipv4 inet fw a4, ipv6 inet fw a6\n",
        );
    }

    #[test]
    fn describe_failure_numbers_causes() {
        let e = anyhow::anyhow!("inner").context("outer");
        assert_eq!(
            describe_failure("Failed:", &e),
            "Failed:\n[1] outer\n[2] inner",
        );
    }
}
